use std::sync::Arc;

use async_trait::async_trait;
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use tracing::{debug, info};

use crate::api::{self, HttpClient};
use crate::args::{split_command_line, tokenize};
use crate::catalog::CatalogCache;
use crate::chat::{Attachment, CommandContext, Message, Messenger, SlashCommand};
use crate::config::{Config, ValidationMode};
use crate::error::{CatalogError, MemeError};
use crate::models::{Catalog, RenderRequest, RenderResponse};

pub const LIST_FLAG: &str = "--list";

/// What a command invocation ends up sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Private text for the invoking user.
    Notice(String),
    /// Rendered image for the room.
    Image(Attachment),
}

/// State shared by the meme commands.
pub struct MemeService {
    http: Arc<dyn HttpClient>,
    catalog: Arc<CatalogCache>,
    render_url: String,
    validation: ValidationMode,
}

impl MemeService {
    pub fn new(config: &Config, http: Arc<dyn HttpClient>) -> Self {
        let catalog = Arc::new(CatalogCache::new(Arc::clone(&http), &config.catalog_url));
        Self {
            http,
            catalog,
            render_url: config.render_url.clone(),
            validation: config.validation,
        }
    }

    pub fn catalog(&self) -> &Arc<CatalogCache> {
        &self.catalog
    }

    /// The `*name*: _title_` listing of every template.
    pub async fn list(&self) -> Result<Reply, MemeError> {
        let catalog = self.catalog.available_memes().await?;
        Ok(Reply::Notice(format_listing(&catalog)))
    }

    /// Handles the logical arguments of one `meme` invocation.
    pub async fn respond(&self, args: &[String]) -> Result<Reply, MemeError> {
        if args.first().map(String::as_str) == Some(LIST_FLAG) {
            return self.list().await;
        }

        let request = RenderRequest::from_args(args).ok_or(MemeError::InvalidArguments)?;

        let title = match self.validation {
            ValidationMode::Strict => {
                let catalog = self.catalog.available_memes().await?;
                match catalog.get(&request.template) {
                    Some(entry) => entry.title.clone(),
                    None => return Err(unknown_template(&request.template, &catalog)),
                }
            }
            ValidationMode::Permissive => request.template.clone(),
        };

        let image_url = self.render(&request).await?;
        Ok(Reply::Image(Attachment { title, image_url }))
    }

    async fn render(&self, request: &RenderRequest) -> Result<String, MemeError> {
        let url = api::render_url(&self.render_url, request)?;
        debug!(%url, "Requesting meme render");

        let response = self
            .http
            .get(url.as_str())
            .await
            .map_err(MemeError::Transport)?;

        let status = response.status;
        if !response.is_success() {
            debug!(status, "Did not get a valid render response");
            return Err(MemeError::UpstreamFetchFailure { status });
        }

        response
            .body
            .and_then(|body| serde_json::from_value::<RenderResponse>(body).ok())
            .map(|rendered| rendered.direct.masked)
            .ok_or_else(|| {
                debug!(status, "Render response carried no image link");
                MemeError::UpstreamFetchFailure { status }
            })
    }
}

/// Renders the template listing, one `*name*: _title_` line per entry.
pub fn format_listing(catalog: &Catalog) -> String {
    catalog
        .values()
        .map(|template| format!("*{}*: _{}_\n", template.name, template.title))
        .collect()
}

fn unknown_template(key: &str, catalog: &Catalog) -> MemeError {
    let matcher = SkimMatcherV2::default();
    let suggestion = catalog
        .keys()
        .filter_map(|name| matcher.fuzzy_match(name, key).map(|score| (score, name)))
        .max_by_key(|(score, _)| *score)
        .map(|(_, name)| name.clone());

    MemeError::UnknownTemplate {
        key: key.to_string(),
        known: catalog.keys().cloned().collect(),
        suggestion,
    }
}

/// Sends `reply` the way the host expects: notices privately, images to the room.
async fn deliver(
    context: &CommandContext,
    messenger: &dyn Messenger,
    reply: Result<Reply, MemeError>,
) -> anyhow::Result<()> {
    let message = Message::start(&context.sender, &context.room);
    match reply {
        Ok(Reply::Notice(text)) => {
            messenger
                .notify_user(&context.sender, message.with_text(text))
                .await?
        }
        Ok(Reply::Image(attachment)) => {
            info!(template = %attachment.title, user = %context.sender.username, "Posting meme");
            messenger.send(message.with_attachment(attachment)).await?
        }
        Err(e) => {
            debug!(args = ?context.arguments, "Meme command failed: {e}");
            messenger
                .notify_user(&context.sender, message.with_text(e.notice_text()))
                .await?
        }
    }
    Ok(())
}

/// `/meme <template> <line1> [line2]` and `/meme --list`.
pub struct MemeCommand {
    service: Arc<MemeService>,
}

#[async_trait]
impl SlashCommand for MemeCommand {
    fn command(&self) -> &'static str {
        "meme"
    }

    fn description(&self) -> &'static str {
        "Generate a new meme image"
    }

    fn params_example(&self) -> &'static str {
        "template \"top line\" \"bottom line\" | --list"
    }

    async fn execute(
        &self,
        context: CommandContext,
        messenger: &dyn Messenger,
    ) -> anyhow::Result<()> {
        let args = tokenize(&context.arguments);
        let reply = self.service.respond(&args).await;
        deliver(&context, messenger, reply).await
    }
}

/// `/meme-list`.
pub struct MemeListCommand {
    service: Arc<MemeService>,
}

#[async_trait]
impl SlashCommand for MemeListCommand {
    fn command(&self) -> &'static str {
        "meme-list"
    }

    fn description(&self) -> &'static str {
        "Get a list of available memes"
    }

    async fn execute(
        &self,
        context: CommandContext,
        messenger: &dyn Messenger,
    ) -> anyhow::Result<()> {
        let reply = self.service.list().await;
        deliver(&context, messenger, reply).await
    }
}

/// Registers the meme commands and routes typed command lines to them.
pub struct MemeApp {
    service: Arc<MemeService>,
    commands: Vec<Arc<dyn SlashCommand>>,
    preload_catalog: bool,
}

impl MemeApp {
    pub fn new(config: &Config, http: Arc<dyn HttpClient>) -> Self {
        let service = Arc::new(MemeService::new(config, http));
        let commands: Vec<Arc<dyn SlashCommand>> = vec![
            Arc::new(MemeCommand {
                service: Arc::clone(&service),
            }),
            Arc::new(MemeListCommand {
                service: Arc::clone(&service),
            }),
        ];
        Self {
            service,
            commands,
            preload_catalog: config.preload_catalog,
        }
    }

    /// Loads the catalog up front when configured to. A failure here is
    /// returned to the caller rather than reported to any user.
    pub async fn initialize(&self) -> Result<(), CatalogError> {
        if self.preload_catalog {
            self.service.catalog().available_memes().await?;
        }
        Ok(())
    }

    pub fn catalog(&self) -> &Arc<CatalogCache> {
        self.service.catalog()
    }

    pub fn commands(&self) -> &[Arc<dyn SlashCommand>] {
        &self.commands
    }

    /// Finds the command a typed line addresses, along with its raw tokens.
    pub fn route(&self, line: &str) -> Option<(Arc<dyn SlashCommand>, Vec<String>)> {
        let (name, tokens) = split_command_line(line)?;
        let command = self.commands.iter().find(|c| c.command() == name)?;
        Some((
            Arc::clone(command),
            tokens.into_iter().map(str::to_string).collect(),
        ))
    }
}
