use flow_core::Memory;
use serde_json::Value;

/// Memory snippets handed to agents: up to `max_items` entries relevant to
/// `query`, rendered as strings. Retrieval failures give an empty context.
pub async fn build_context(
    memory: &dyn Memory,
    user_id: &str,
    query: &str,
    max_items: usize,
) -> Vec<String> {
    let items = match memory.retrieve(user_id, query, max_items).await {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!("Context retrieval failed for {}: {:#}", user_id, e);
            Vec::new()
        }
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct Broken;

    #[async_trait]
    impl Memory for Broken {
        async fn persist(&self, _: &str, _: Value, _: Vec<String>) -> anyhow::Result<()> {
            anyhow::bail!("read-only")
        }
        async fn retrieve(&self, _: &str, _: &str, _: usize) -> anyhow::Result<Vec<Value>> {
            anyhow::bail!("disk on fire")
        }
    }

    #[tokio::test]
    async fn test_failure_is_empty_context() {
        assert!(build_context(&Broken, "u", "q", 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_items_rendered_as_strings() {
        let dir = tempfile::TempDir::new().unwrap();
        let mem = flow_memory::LocalMemory::open(dir.path().join("m.json")).await;
        mem.persist("u", json!("plain note"), vec![]).await.unwrap();
        mem.persist("u", json!({"type": "goal"}), vec![]).await.unwrap();
        let ctx = build_context(&mem, "u", "", 5).await;
        assert_eq!(ctx, vec!["plain note".to_string(), r#"{"type":"goal"}"#.to_string()]);
    }
}
