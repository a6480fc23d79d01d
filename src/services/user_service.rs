//! Registration, subscriptions, and rights management.

use std::sync::Arc;

use chrono::NaiveDate;
use rand::prelude::IndexedRandom;

use crate::error::AppResult;
use crate::gateway::{ChatGateway, UserIdentity};
use crate::models::NewUser;
use crate::repositories::{RegistrationOutcome, UserRepository};

const WELCOME_PHRASES: &[&str] = &[
    "Registration complete!",
    "You are all set!",
    "Done, welcome aboard!",
    "All good, you are in!",
];

const ALREADY_KNOWN_PHRASES: &[&str] = &[
    "We have met before, your card is already on file.",
    "Registering twice will not work..",
    "Again? Once is enough ;)",
    "You seem to have forgotten, you are already registered! :)",
];

const MENU_HINT: &str = "Open /menu to see what I can do.";

#[derive(Clone)]
pub struct UserService {
    users: UserRepository,
    gateway: Arc<dyn ChatGateway>,
    dev_chat_id: i64,
}

impl UserService {
    pub fn new(users: UserRepository, gateway: Arc<dyn ChatGateway>, dev_chat_id: i64) -> Self {
        Self {
            users,
            gateway,
            dev_chat_id,
        }
    }

    /// Registers the caller and returns the reply text. A repeat attempt
    /// changes nothing in the store and gets a different phrase. New
    /// registrations are reported to the dev chat, best effort.
    pub async fn register(&self, identity: &UserIdentity, today: NaiveDate) -> AppResult<String> {
        let outcome = self
            .users
            .register(NewUser {
                user_id: identity.id,
                first_name: identity.first_name.clone(),
                last_name: identity.last_name.clone(),
                username: identity.username.clone(),
                registration_date: today,
            })
            .await?;

        let phrases = match outcome {
            RegistrationOutcome::Created => WELCOME_PHRASES,
            RegistrationOutcome::AlreadyRegistered => ALREADY_KNOWN_PHRASES,
        };
        let phrase = phrases
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(phrases[0]);

        if outcome == RegistrationOutcome::Created {
            let report = format!(
                "New user registered:\n\u{2022} ID: {}\n\u{2022} First name: {}\n\u{2022} Last name: {}\n\u{2022} Username: @{}",
                identity.id,
                identity.first_name.as_deref().unwrap_or("-"),
                identity.last_name.as_deref().unwrap_or("-"),
                identity.username.as_deref().unwrap_or("-"),
            );
            if let Err(error) = self.gateway.send_text(self.dev_chat_id, &report).await {
                tracing::warn!(%error, "Failed to report registration to the dev chat");
            }
        }

        Ok(format!("{phrase}\n{MENU_HINT}"))
    }

    /// Flips the IT-news subscription, reply text states the new state.
    pub async fn toggle_news(&self, user_id: i64) -> AppResult<String> {
        let enabled = self.users.toggle_news(user_id).await?;
        Ok(if enabled {
            "You are now subscribed to IT department news.".to_string()
        } else {
            "IT department news subscription disabled.".to_string()
        })
    }

    /// Flips the marketplace subscription, reply text states the new state.
    pub async fn toggle_marketplace(&self, user_id: i64) -> AppResult<String> {
        let enabled = self.users.toggle_marketplace(user_id).await?;
        Ok(if enabled {
            "You are now subscribed to the marketplace.".to_string()
        } else {
            "Marketplace subscription disabled.".to_string()
        })
    }

    pub async fn promote(&self, target_id: i64) -> AppResult<String> {
        let touched = self.users.set_rights(target_id, "admin").await?;
        Ok(if touched > 0 {
            format!("User {target_id} now has admin rights.")
        } else {
            format!("User {target_id} is not registered.")
        })
    }

    pub async fn demote(&self, target_id: i64) -> AppResult<String> {
        let touched = self.users.set_rights(target_id, "user").await?;
        Ok(if touched > 0 {
            format!("User {target_id} no longer has admin rights.")
        } else {
            format!("User {target_id} is not registered.")
        })
    }

    /// One line per registered user, registration order.
    pub async fn user_list_text(&self) -> AppResult<String> {
        let users = self.users.list_all().await?;
        if users.is_empty() {
            return Ok("No registered users yet.".to_string());
        }
        let mut lines = vec![format!("Registered users: {}", users.len())];
        for user in users {
            lines.push(format!("{} \u{2014} {}", user.user_id, user.display_name()));
        }
        Ok(lines.join("\n"))
    }
}
