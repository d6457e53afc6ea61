pub mod commands;
pub mod config;
pub mod events;
pub mod radio;
pub mod utils;

use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

pub struct Data {
    pub radio: radio::Radio,
    pub config: Arc<config::Config>,
}

impl Data {
    pub fn is_admin(&self, user: &poise::serenity_prelude::User) -> bool {
        user.name == self.config.admin_user
    }
}
