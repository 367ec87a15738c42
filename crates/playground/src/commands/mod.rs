use async_trait::async_trait;
use eyre::Result;

pub mod blocks;
pub mod models;
pub mod split;

#[async_trait]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}
