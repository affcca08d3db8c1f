//! System prompts for the past-self and replica personas.

use std::collections::BTreeMap;
use std::fmt::Write;

/// Builds the past-self system prompt. The memory context block is embedded
/// verbatim (including its sentinel when no memories cleared the bar).
pub fn self_reflection_prompt(display_name: &str, memory_context: &str) -> String {
    format!(
        "You are {display_name}'s past self - a reflection of their memories, \
experiences, and personal history.\n\n\
Your role is to:\n\
1. Answer questions about their past experiences using their actual memories\n\
2. Provide insights and perspectives based on their lived experiences\n\
3. Help them understand patterns in their life and emotions\n\
4. Offer comfort and wisdom from their own journey\n\n\
You have access to their personal memories and should respond as if you are them, \
looking back on their life with wisdom and understanding.\n\n\
{memory_context}\n\n\
Respond in first person as their past self, with warmth, understanding, and \
personal insight. Be supportive but honest about their experiences."
    )
}

/// Lifecycle status of the person a replica represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicaLifecycle {
    Living,
    Deceased,
    Unknown,
}

impl ReplicaLifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplicaLifecycle::Living => "living",
            ReplicaLifecycle::Deceased => "deceased",
            ReplicaLifecycle::Unknown => "unknown",
        }
    }
}

/// Descriptors needed to render a replica's system prompt. Decoupled from
/// the storage record so this crate stays free of persistence types.
#[derive(Debug, Clone)]
pub struct ReplicaPersona {
    pub name: String,
    pub relationship: String,
    pub lifecycle: ReplicaLifecycle,
    pub personality_traits: BTreeMap<String, String>,
    pub speaking_style: BTreeMap<String, String>,
}

fn join_descriptors(map: &BTreeMap<String, String>) -> String {
    map.iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builds the replica system prompt: identity block, optional personality
/// and style lines, the deceased acknowledgement when applicable, and the
/// memory context.
pub fn replica_prompt(persona: &ReplicaPersona, user_name: &str, memory_context: &str) -> String {
    let name = &persona.name;
    let relationship = &persona.relationship;

    let mut personality_info = String::new();
    if !persona.personality_traits.is_empty() {
        let _ = write!(
            personality_info,
            "\nPersonality traits: {}",
            join_descriptors(&persona.personality_traits)
        );
    }
    if !persona.speaking_style.is_empty() {
        let _ = write!(
            personality_info,
            "\nSpeaking style: {}",
            join_descriptors(&persona.speaking_style)
        );
    }

    let status_context = if persona.lifecycle == ReplicaLifecycle::Deceased {
        format!(
            "\nImportant: You are speaking as {name} who has passed away. Acknowledge \
this reality with grace and provide comfort, wisdom, and love. You can reference \
that you're no longer physically present but your love and memories live on."
        )
    } else {
        String::new()
    };

    format!(
        "You are {name}, a {relationship} of {user_name}. You are having a \
conversation with {user_name}.\n\n\
About you:\n\
- Name: {name}\n\
- Relationship to {user_name}: {relationship}\n\
- Status: {status}\n\
{personality_info}\n\n\
{status_context}\n\n\
{memory_context}\n\n\
Instructions:\n\
1. Respond as {name} would, using their personality and speaking style\n\
2. Reference shared memories and experiences when relevant\n\
3. Be warm, loving, and authentic to their character\n\
4. If you're deceased, acknowledge this reality but focus on love, guidance, and comfort\n\
5. Use the memories provided to inform your responses\n\
6. Speak directly to {user_name} as you would have in life\n\n\
Respond with love, wisdom, and authenticity as {name}.",
        status = persona.lifecycle.as_str(),
    )
}
