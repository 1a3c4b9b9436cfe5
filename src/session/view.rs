use serde::Serialize;

use super::Action;

/// The single button area of the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    Loading,
    Error { message: String, retry: Action },
    ConnectWallet,
    Whitelisted,
    JoinWhitelist,
}

impl View {
    pub fn label(&self) -> String {
        match self {
            View::Loading => "Loading...".into(),
            View::Error { message, .. } => format!("Something went wrong: {message}"),
            View::ConnectWallet => "Connect to your wallet".into(),
            View::Whitelisted => "Thanks for joining the whitelist!".into(),
            View::JoinWhitelist => "Join the whitelist!".into(),
        }
    }

    /// What a click triggers, if the view is interactive.
    pub fn on_click(&self) -> Option<Action> {
        match self {
            View::Loading | View::Whitelisted => None,
            View::Error { retry, .. } => Some(*retry),
            View::ConnectWallet => Some(Action::Connect),
            View::JoinWhitelist => Some(Action::Join),
        }
    }

    pub fn is_interactive(&self) -> bool { self.on_click().is_some() }
}
