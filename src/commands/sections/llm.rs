use super::*;

const SYSTEM_PROMPT: &str = "You identify paragraph structure in text extracted from building code PDFs. \
Reply with a valid JSON array only, with no commentary. Text under different heading numbers \
(for example 1.2.2.1 and 1.2.2.2) must never share a paragraph.";

#[derive(Debug, Clone)]
pub(super) struct LlmConfig {
    pub(super) api_key: String,
    pub(super) model: String,
    pub(super) endpoint: String,
    pub(super) batch_size: usize,
    pub(super) delay: Duration,
    pub(super) temperature: f64,
    pub(super) timeout: Duration,
}

impl LlmConfig {
    pub(super) fn from_args(args: &LlmArgs) -> Result<Self> {
        let api_key = args
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .context("--merge llm needs an API key (--api-key or OPENAI_API_KEY)")?;
        if args.llm_batch_size == 0 {
            bail!("--llm-batch-size must be at least 1");
        }

        Ok(Self {
            api_key: api_key.to_string(),
            model: args.llm_model.clone(),
            endpoint: args.llm_endpoint.clone(),
            batch_size: args.llm_batch_size,
            delay: Duration::from_millis(args.llm_delay_ms),
            temperature: args.llm_temperature,
            timeout: Duration::from_secs(args.llm_timeout_secs),
        })
    }
}

/// One chat-completion round trip.
pub(super) trait CompletionClient {
    fn complete(&self, system: &str, user: &str) -> Result<String>;
}

pub(super) struct HttpCompletionClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f64,
}

impl HttpCompletionClient {
    pub(super) fn new(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

impl CompletionClient for HttpCompletionClient {
    fn complete(&self, system: &str, user: &str) -> Result<String> {
        #[derive(Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            messages: Vec<Message<'a>>,
            temperature: f64,
        }

        #[derive(Serialize)]
        struct Message<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: ResponseMessage,
        }

        #[derive(Deserialize)]
        struct ResponseMessage {
            content: String,
        }

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .with_context(|| format!("failed to call {}", self.endpoint))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            bail!("completion endpoint returned {status}: {body}");
        }

        let chat: ChatResponse = response
            .json()
            .context("failed to parse completion response")?;
        chat.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .context("completion response has no choices")
    }
}

#[derive(Debug, Deserialize)]
struct ParagraphGroup {
    chunk_indices: Vec<usize>,
}

/// Extracts the JSON group array from a model reply that may carry extra
/// prose or a fenced code block around it.
pub(super) struct GroupResponseParser {
    bare_array: Regex,
    fenced_json: Regex,
}

impl GroupResponseParser {
    pub(super) fn new() -> Result<Self> {
        Ok(Self {
            bare_array: compile(r"(?s)\[\s*\{.*\}\s*\]")?,
            fenced_json: compile(r"(?s)```json\s*(.*?)\s*```")?,
        })
    }

    pub(super) fn parse(&self, content: &str) -> Result<Vec<Vec<usize>>> {
        let candidates = [
            Some(content.trim()),
            self.bare_array.find(content).map(|found| found.as_str()),
            self.fenced_json
                .captures(content)
                .and_then(|captures| captures.get(1))
                .map(|found| found.as_str()),
        ];

        candidates
            .into_iter()
            .flatten()
            .find_map(|candidate| serde_json::from_str::<Vec<ParagraphGroup>>(candidate).ok())
            .map(|groups| groups.into_iter().map(|group| group.chunk_indices).collect())
            .with_context(|| format!("could not find a paragraph group array in reply: {content}"))
    }
}

/// Asks a chat model how to group chunks, `batch_size` chunks per request.
/// A failed request or unreadable reply merges that whole batch into one
/// paragraph.
pub(super) struct LlmGrouper<C: CompletionClient> {
    config: LlmConfig,
    client: C,
    parser: GroupResponseParser,
    requests: Cell<usize>,
}

impl<C: CompletionClient> LlmGrouper<C> {
    pub(super) fn new(config: LlmConfig, client: C) -> Result<Self> {
        Ok(Self {
            config,
            client,
            parser: GroupResponseParser::new()?,
            requests: Cell::new(0),
        })
    }

    fn group_batch(&self, batch: &[String]) -> Vec<Vec<usize>> {
        if self.requests.get() > 0 && !self.config.delay.is_zero() {
            thread::sleep(self.config.delay);
        }
        self.requests.set(self.requests.get() + 1);

        let reply = build_prompt(batch).and_then(|prompt| self.client.complete(SYSTEM_PROMPT, &prompt));
        match reply.and_then(|content| self.parser.parse(&content)) {
            Ok(groups) => groups,
            Err(error) => {
                warn!(chunks = batch.len(), error = %error, "llm grouping failed; merging batch into one paragraph");
                vec![(0..batch.len()).collect()]
            }
        }
    }
}

impl<C: CompletionClient> ParagraphGrouper for LlmGrouper<C> {
    fn name(&self) -> &'static str {
        "llm"
    }

    fn group(&self, chunks: &[String]) -> Result<Vec<Vec<usize>>> {
        let mut groups = Vec::new();
        for (batch_index, batch) in chunks.chunks(self.config.batch_size).enumerate() {
            let offset = batch_index * self.config.batch_size;
            debug!(offset, chunks = batch.len(), model = %self.config.model, "requesting paragraph groups");
            let batch_groups = sanitize_groups(&self.group_batch(batch), batch.len());
            groups.extend(
                batch_groups
                    .into_iter()
                    .map(|group| group.into_iter().map(|index| index + offset).collect()),
            );
        }
        Ok(groups)
    }
}

fn build_prompt(batch: &[String]) -> Result<String> {
    let chunks = serde_json::to_string(batch).context("failed to encode chunks for prompt")?;
    Ok(format!(
        "The text blocks below come from a building code PDF converted to HTML. The conversion \
split every printed line into its own block. Decide which blocks belong to the same paragraph.\n\n\
Rules:\n\
1. Headings such as \"1.2.3.4\", \"Article 1.2.3.4\" or \"Section 1.2.3\" are paragraphs of their own.\n\
2. Text under one heading never shares a paragraph with text under another heading.\n\
3. A block like \"1.2.3.4 Something\" starts a heading and is separated from the text before it.\n\
4. Numbered items such as 1), 2), a), b) each start a paragraph; their wrapped lines join that item.\n\n\
Answer with a JSON array, one element per paragraph, in this shape:\n\
[{{\"paragraph_index\": 0, \"chunk_indices\": [0, 1, 2]}}]\n\
Return only the array.\n\n\
Text blocks:\n{chunks}\n"
    ))
}
