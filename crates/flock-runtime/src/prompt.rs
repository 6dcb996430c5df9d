//! 交互式输入
//! Interactive input for missing start-agent keys

use crate::error::{FlockError, FlockResult};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// 输入提示器
/// Asks for a value the caller did not supply
#[async_trait]
pub trait InputPrompter: Send + Sync {
    async fn prompt(&self, agent: &str, key: &str) -> FlockResult<String>;
}

/// 标准输入提示器
/// Reads one line from stdin per key
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinPrompter;

#[async_trait]
impl InputPrompter for StdinPrompter {
    async fn prompt(&self, agent: &str, key: &str) -> FlockResult<String> {
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(format!("Please enter {key} for {agent}: ").as_bytes())
            .await
            .map_err(|e| FlockError::Prompt(e.to_string()))?;
        stdout
            .flush()
            .await
            .map_err(|e| FlockError::Prompt(e.to_string()))?;

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(|e| FlockError::Prompt(e.to_string()))?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}
