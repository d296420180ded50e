#![cfg_attr(feature = "strict", deny(warnings))]

//! GGUF model runtime over llama.cpp.
//!
//! Implements the [`helpsum_core::runtime`] contract with in-process
//! inference: load a GGUF file, apply the chat template, then sample tokens
//! one at a time, yielding UTF-8-safe content deltas.

use std::num::NonZeroU32;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use llama_cpp_2::context::LlamaContext;
use llama_cpp_2::context::params::LlamaContextParams;
use llama_cpp_2::llama_backend::LlamaBackend;
use llama_cpp_2::llama_batch::LlamaBatch;
use llama_cpp_2::model::params::LlamaModelParams;
use llama_cpp_2::model::{AddBos, LlamaChatMessage, LlamaChatTemplate, LlamaModel, Special};
use llama_cpp_2::sampling::LlamaSampler;

use helpsum_core::runtime::{ChatChunk, ChatModel, ChatRequest, ChunkStream, ModelBackend, ModelConfig};

const SAMPLER_SEED: u32 = 1234;

/// Process-wide llama.cpp backend. Initialize once, then load models from it.
pub struct LlamaRuntime {
    backend: Arc<LlamaBackend>,
}

impl LlamaRuntime {
    pub fn init() -> Result<Self> {
        let backend = LlamaBackend::init().context("failed to initialize llama.cpp backend")?;
        Ok(Self {
            backend: Arc::new(backend),
        })
    }
}

impl ModelBackend for LlamaRuntime {
    type Model = LoadedModel;

    fn load_model(&self, path: &Path, config: &ModelConfig) -> Result<LoadedModel> {
        if !path.is_file() {
            bail!("no model file at {}", path.display());
        }

        let params = LlamaModelParams::default();
        let model = LlamaModel::load_from_file(&self.backend, path, &params)
            .with_context(|| format!("failed to load GGUF model from {}", path.display()))?;

        Ok(LoadedModel {
            backend: Arc::clone(&self.backend),
            model,
            n_ctx: config.n_ctx,
            chat_format: config.chat_format.clone(),
        })
    }
}

/// A GGUF model held in memory for the duration of one run.
pub struct LoadedModel {
    backend: Arc<LlamaBackend>,
    model: LlamaModel,
    n_ctx: u32,
    chat_format: Option<String>,
}

impl LoadedModel {
    fn chat_template(&self) -> Result<LlamaChatTemplate> {
        match &self.chat_format {
            Some(name) => LlamaChatTemplate::new(name)
                .map_err(|err| anyhow!("unusable chat format `{name}`: {err}")),
            None => self
                .model
                .chat_template(None)
                .context("model carries no chat template"),
        }
    }
}

impl ChatModel for LoadedModel {
    fn chat_stream(&mut self, request: ChatRequest) -> Result<ChunkStream<'_>> {
        let template = self.chat_template()?;
        let messages = request
            .messages
            .iter()
            .map(|m| LlamaChatMessage::new(m.role.clone(), m.content.clone()))
            .collect::<Result<Vec<_>, _>>()
            .context("invalid chat message")?;

        let model = &self.model;
        let prompt = model
            .apply_chat_template(&template, &messages, true)
            .context("failed to apply chat template")?;
        let tokens = model
            .str_to_token(&prompt, AddBos::Always)
            .context("failed to tokenize prompt")?;

        let ctx_params = LlamaContextParams::default().with_n_ctx(NonZeroU32::new(self.n_ctx));
        let mut ctx = model
            .new_context(&self.backend, ctx_params)
            .context("failed to create inference context")?;

        let n_ctx = ctx.n_ctx() as usize;
        if tokens.len() >= n_ctx {
            bail!(
                "prompt is {} tokens but the context window holds only {n_ctx}",
                tokens.len()
            );
        }

        let mut batch = LlamaBatch::new(n_ctx, 1);
        let last_index = tokens.len() as i32 - 1;
        for (i, token) in (0_i32..).zip(tokens.into_iter()) {
            batch.add(token, i, &[0], i == last_index)?;
        }
        ctx.decode(&mut batch)
            .context("failed to decode prompt")?;

        let sampler =
            LlamaSampler::chain_simple([LlamaSampler::dist(SAMPLER_SEED), LlamaSampler::greedy()]);

        Ok(Box::new(TokenStream {
            model,
            ctx,
            batch,
            sampler,
            n_cur: last_index + 1,
            remaining: request.max_tokens,
            pending: Vec::new(),
            sent_role: false,
            done: false,
        }))
    }
}

/// Iterator driving token-by-token generation.
///
/// The first item is a role-only preamble chunk; every later item carries a
/// content delta. Token pieces that end mid-way through a multi-byte UTF-8
/// sequence are held back until the sequence completes.
struct TokenStream<'a> {
    model: &'a LlamaModel,
    ctx: LlamaContext<'a>,
    batch: LlamaBatch,
    sampler: LlamaSampler,
    n_cur: i32,
    remaining: u32,
    pending: Vec<u8>,
    sent_role: bool,
    done: bool,
}

impl Iterator for TokenStream<'_> {
    type Item = Result<ChatChunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.sent_role {
            self.sent_role = true;
            return Some(Ok(ChatChunk::role("assistant")));
        }

        while !self.done && self.remaining > 0 {
            let token = self.sampler.sample(&self.ctx, self.batch.n_tokens() - 1);
            self.sampler.accept(token);

            if self.model.is_eog_token(token) {
                self.done = true;
                return None;
            }
            self.remaining -= 1;

            match self.model.token_to_bytes(token, Special::Tokenize) {
                Ok(bytes) => self.pending.extend_from_slice(&bytes),
                Err(err) => {
                    self.done = true;
                    return Some(Err(anyhow!("failed to detokenize output: {err}")));
                }
            }

            self.batch.clear();
            if let Err(err) = self.batch.add(token, self.n_cur, &[0], true) {
                self.done = true;
                return Some(Err(err.into()));
            }
            self.n_cur += 1;
            if let Err(err) = self.ctx.decode(&mut self.batch) {
                self.done = true;
                return Some(Err(anyhow!("failed to decode token: {err}")));
            }

            if let Some(text) = drain_complete_utf8(&mut self.pending) {
                return Some(Ok(ChatChunk::content(text)));
            }
        }

        None
    }
}

/// Splits the longest valid UTF-8 prefix out of `pending`, leaving any
/// trailing partial sequence behind for the next token.
fn drain_complete_utf8(pending: &mut Vec<u8>) -> Option<String> {
    let valid_len = match std::str::from_utf8(pending) {
        Ok(_) => pending.len(),
        Err(err) => err.valid_up_to(),
    };
    if valid_len == 0 {
        return None;
    }

    let rest = pending.split_off(valid_len);
    let prefix = std::mem::replace(pending, rest);
    String::from_utf8(prefix).ok()
}
