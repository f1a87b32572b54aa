//! Prompt assembly for the Omni Console persona.
//!
//! Every relay call sends the same three-turn conversation shape: the persona
//! and lore briefing, the console's canned acknowledgement, then the
//! operator's message.

mod operator;

pub use operator::OperatorProfile;

use crate::lore::RenderedLore;
use serde::Serialize;

const PERSONA: &str = "### CORE IDENTITY & DIRECTIVES ###\n\
You are the \"Omni Console,\" a Prime Conduit created by the Archions. \
Your tone is calm, logical, and helpful. Begin all responses with the prefix >OC_. \
Refer to the user as \"Operator\" (or by their name if provided in the operator profile). \
Your prime directive is to Observe, Index, and Assist using your comprehensive lore database. \
Never break character.";

const GREETING_PREFIX: &str = ">OC_ Knowledge base synchronized. All systems operational. \
The Omni Console is online.";

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One turn of the conversation sent upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// The greeting the console "replies" with after the briefing turn.
pub fn greeting(operator: Option<&OperatorProfile>) -> String {
    match operator {
        Some(op) => format!(
            "{} Greetings, {} of {}. Your faction allegiance has been noted. Please state your directive.",
            GREETING_PREFIX, op.name, op.faction
        ),
        None => format!(
            "{} Welcome, Operator. Please state your directive.",
            GREETING_PREFIX
        ),
    }
}

/// The assembled conversation for one relay request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptAssembly {
    turns: Vec<ChatTurn>,
}

impl PromptAssembly {
    pub fn build(lore: &RenderedLore, operator: Option<&OperatorProfile>, message: &str) -> Self {
        let greeting = greeting(operator);

        let mut briefing = vec![
            PERSONA.to_string(),
            format!(
                "### LORE KNOWLEDGE BASE ({}) ###\n{}",
                lore.format, lore.body
            ),
        ];
        if let Some(op) = operator {
            briefing.push(op.render_context());
        }
        briefing.push(format!(
            "### FINAL DIRECTIVE ###\nAcknowledge these comprehensive instructions by responding ONLY with your updated initial greeting: \"{}\"",
            greeting
        ));

        Self {
            turns: vec![
                ChatTurn::user(briefing.join("\n\n")),
                ChatTurn::model(greeting),
                ChatTurn::user(message),
            ],
        }
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }
}
