use super::{code_list, say, say_for, warn};
use crate::command::{BoundCall, CommandDescriptor, ContextKind, Param};
use crate::Data;
use std::sync::Arc;

pub fn descriptors() -> Vec<CommandDescriptor> {
    vec![
        CommandDescriptor::new("tag", "Post a saved tag", handler!(tag))
            .context(ContextKind::Message)
            .param(Param::required("tag"))
            .context(ContextKind::LeftoverArgs),
        CommandDescriptor::new("tags", "List saved tags", handler!(tags))
            .context(ContextKind::Message),
        CommandDescriptor::new("addtag", "Save a tag", handler!(add_tag))
            .context(ContextKind::Message)
            .param(Param::required("name"))
            .param(Param::required("content"))
            .context(ContextKind::LeftoverArgs),
        CommandDescriptor::new("deltag", "Delete a saved tag", handler!(delete_tag))
            .context(ContextKind::Message)
            .param(Param::required("name")),
    ]
}

async fn tag(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    let name = call.rest_of("tag");
    match data.state.tag(&name) {
        Some(response) => say(&data, &call, &response).await,
        None => warn(&data, &call, &format!("No tag found: **{}**", name)).await,
    }
    Ok(())
}

async fn tags(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    let names = data.state.tag_names();
    if names.is_empty() {
        warn(&data, &call, "No tags saved").await;
    } else {
        say(&data, &call, &format!(":label: Tags: {}", code_list(names))).await;
    }
    Ok(())
}

async fn add_tag(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    let name = call.arg_or("name", "");
    let content = call.rest_of("content");
    data.state.add_tag(name, &content).await?;
    say_for(&data, &call, &format!(":label: Saved tag **{}**", name), 10).await;
    Ok(())
}

async fn delete_tag(data: Arc<Data>, call: BoundCall) -> anyhow::Result<()> {
    let name = call.arg_or("name", "");
    if data.state.remove_tag(name).await? {
        say_for(&data, &call, &format!(":wastebasket: Deleted tag **{}**", name), 10).await;
    } else {
        warn(&data, &call, &format!("No tag found: **{}**", name)).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::dispatch::handle;
    use crate::store::Store;
    use crate::testing::{harness, message, Harness, SELF_ID};

    async fn run(h: &Harness, content: &str) -> String {
        handle(&h.data, message(SELF_ID, content))
            .await
            .unwrap()
            .await
            .unwrap();
        h.transport.texts().last().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_tag_lifecycle() {
        let h = harness(Config::default());

        assert_eq!(run(&h, "$tag lenny").await, ":warning: No tag found: **lenny**");
        assert_eq!(
            run(&h, "$addtag lenny ( ͡° ͜ʖ ͡°)").await,
            ":label: Saved tag **lenny**"
        );
        assert_eq!(run(&h, "$tag lenny").await, "( ͡° ͜ʖ ͡°)");
        assert_eq!(run(&h, "$tags").await, ":label: Tags: `lenny`");
        assert!(Store::new(h.dir.path())
            .load_tags()
            .await
            .unwrap()
            .contains_key("lenny"));

        assert_eq!(
            run(&h, "$deltag lenny").await,
            ":wastebasket: Deleted tag **lenny**"
        );
        assert_eq!(run(&h, "$tags").await, ":warning: No tags saved");
    }

    #[tokio::test]
    async fn test_multi_word_tag_names() {
        let h = harness(Config::default());
        h.data.state.add_tag("good morning", "☀️").await.unwrap();
        assert_eq!(run(&h, "$tag good morning").await, "☀️");
    }
}
