//! Streams a model-generated summary of captured help text.

use std::io::Write;

use anyhow::{Context, Result};

use crate::Options;
use crate::download::Downloader;
use crate::error::Error;
use crate::help;
use crate::resolver;
use crate::runtime::{ChatMessage, ChatModel, ChatRequest, ModelBackend};
use crate::spinner::Spinner;

/// Instruction sent as the system message of every summarization request.
pub const SYSTEM_PROMPT: &str = "The following text is the output of a command's --help option. \
    Please summarize it and explain only the important parts concisely. \
    Do not include asterisks (*) in the output, and remove unnecessary details \
    such as overly specific option descriptions or repetitive explanations. \
    Make sure to convey the purpose of the command, its main usage, and \
    representative options.";

/// Upper bound on generated summary length, in tokens.
pub const MAX_SUMMARY_TOKENS: u32 = 300;

/// Runs the whole pipeline: resolve the model, capture the help text, stream
/// the summary to `out`.
pub fn summarize_command<B: ModelBackend, W: Write>(
    backend: &B,
    downloader: &dyn Downloader,
    options: &Options,
    spinner: &Spinner,
    out: &mut W,
) -> Result<(), Error> {
    let mut model = resolver::resolve_model(backend, downloader, options)?;
    let help_text = help::capture_help(&options.command, options.help_limit)?;
    stream_summary(&mut model, &help_text, spinner, out).map_err(Error::Completion)
}

/// Streams one chat completion, writing content deltas to `out` as they
/// arrive.
///
/// The spinner stays active until the first chunk that carries content;
/// role-only preambles do not stop it. A scoped guard keeps the stop
/// guaranteed on every exit path, including mid-stream faults.
pub fn stream_summary<M: ChatModel, W: Write>(
    model: &mut M,
    help_text: &str,
    spinner: &Spinner,
    out: &mut W,
) -> Result<()> {
    let request = ChatRequest {
        messages: vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(help_text),
        ],
        max_tokens: MAX_SUMMARY_TOKENS,
    };

    let _guard = spinner.guard();
    spinner.start();

    for chunk in model.chat_stream(request)? {
        let chunk = chunk?;
        if let Some(content) = &chunk.content {
            spinner.stop();
            out.write_all(content.as_bytes())
                .context("failed to write summary chunk")?;
            out.flush().context("failed to flush summary chunk")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;

    use anyhow::anyhow;

    use crate::error::{DownloadError, HelpError, ResolveError};
    use crate::runtime::{ChatChunk, ChunkStream, ModelConfig};

    use super::*;

    /// Replays scripted chunks, recording the request, the number of chat
    /// calls, and the spinner state observed before each chunk is yielded.
    struct ScriptedModel {
        chunks: VecDeque<Result<ChatChunk>>,
        spinner: Spinner,
        chat_calls: Rc<RefCell<usize>>,
        requests: Rc<RefCell<Vec<ChatRequest>>>,
        spinner_states: Rc<RefCell<Vec<bool>>>,
    }

    impl ScriptedModel {
        fn new(chunks: Vec<Result<ChatChunk>>, spinner: &Spinner) -> Self {
            Self {
                chunks: chunks.into(),
                spinner: spinner.clone(),
                chat_calls: Rc::default(),
                requests: Rc::default(),
                spinner_states: Rc::default(),
            }
        }
    }

    impl ChatModel for ScriptedModel {
        fn chat_stream(&mut self, request: ChatRequest) -> Result<ChunkStream<'_>> {
            *self.chat_calls.borrow_mut() += 1;
            self.requests.borrow_mut().push(request);

            let spinner = self.spinner.clone();
            let states = Rc::clone(&self.spinner_states);
            let mut chunks = std::mem::take(&mut self.chunks);
            Ok(Box::new(std::iter::from_fn(move || {
                states.borrow_mut().push(spinner.is_stopped());
                chunks.pop_front()
            })))
        }
    }

    fn echo_chunks() -> Vec<Result<ChatChunk>> {
        vec![
            Ok(ChatChunk::role("assistant")),
            Ok(ChatChunk::content("It ")),
            Ok(ChatChunk::content("echoes input.")),
        ]
    }

    #[test]
    fn writes_content_deltas_verbatim() {
        let spinner = Spinner::hidden("thinking");
        let mut model = ScriptedModel::new(echo_chunks(), &spinner);
        let mut out = Vec::new();

        stream_summary(&mut model, "echo help", &spinner, &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "It echoes input.");
    }

    #[test]
    fn spinner_stops_on_first_content_chunk_not_on_role_preamble() {
        let spinner = Spinner::hidden("thinking");
        let mut model = ScriptedModel::new(echo_chunks(), &spinner);
        let states = Rc::clone(&model.spinner_states);
        let mut out = Vec::new();

        stream_summary(&mut model, "echo help", &spinner, &mut out).unwrap();

        // Observed before yielding: role chunk, first content chunk, second
        // content chunk, end of stream.
        assert_eq!(*states.borrow(), vec![false, false, true, true]);
        assert!(spinner.is_stopped());
    }

    #[test]
    fn sends_the_fixed_system_prompt_and_the_help_text() {
        let spinner = Spinner::hidden("thinking");
        let mut model = ScriptedModel::new(echo_chunks(), &spinner);
        let requests = Rc::clone(&model.requests);
        let mut out = Vec::new();

        stream_summary(&mut model, "echo help", &spinner, &mut out).unwrap();

        let requests = requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_tokens, MAX_SUMMARY_TOKENS);
        assert_eq!(
            requests[0].messages,
            vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user("echo help"),
            ]
        );
    }

    #[test]
    fn spinner_is_stopped_when_the_stream_faults_mid_flight() {
        let spinner = Spinner::hidden("thinking");
        let chunks = vec![
            Ok(ChatChunk::role("assistant")),
            Ok(ChatChunk::content("It ")),
            Err(anyhow!("backend fell over")),
        ];
        let mut model = ScriptedModel::new(chunks, &spinner);
        let mut out = Vec::new();

        let err = stream_summary(&mut model, "echo help", &spinner, &mut out).unwrap_err();

        assert!(err.to_string().contains("backend fell over"));
        assert!(spinner.is_stopped());
        assert_eq!(String::from_utf8(out).unwrap(), "It ");
    }

    #[test]
    fn spinner_is_stopped_when_the_stream_ends_without_content() {
        let spinner = Spinner::hidden("thinking");
        let mut model = ScriptedModel::new(vec![Ok(ChatChunk::role("assistant"))], &spinner);
        let mut out = Vec::new();

        stream_summary(&mut model, "echo help", &spinner, &mut out).unwrap();

        assert!(spinner.is_stopped());
        assert!(out.is_empty());
    }

    #[test]
    fn spinner_is_stopped_when_the_request_itself_fails() {
        struct BrokenModel;
        impl ChatModel for BrokenModel {
            fn chat_stream(&mut self, _request: ChatRequest) -> Result<ChunkStream<'_>> {
                Err(anyhow!("prompt does not fit the context window"))
            }
        }

        let spinner = Spinner::hidden("thinking");
        let mut out = Vec::new();

        let err = stream_summary(&mut BrokenModel, "echo help", &spinner, &mut out).unwrap_err();

        assert!(err.to_string().contains("context window"));
        assert!(spinner.is_stopped());
    }

    // End-to-end scenarios over the full pipeline, with a scripted backend in
    // place of the GGUF runtime.

    struct ScriptedBackend {
        model: RefCell<Option<ScriptedModel>>,
    }

    impl ScriptedBackend {
        fn new(model: ScriptedModel) -> Self {
            Self {
                model: RefCell::new(Some(model)),
            }
        }
    }

    impl ModelBackend for ScriptedBackend {
        type Model = ScriptedModel;

        fn load_model(&self, path: &Path, _config: &ModelConfig) -> Result<ScriptedModel> {
            if !path.exists() {
                return Err(anyhow!("no model file at {}", path.display()));
            }
            self.model
                .borrow_mut()
                .take()
                .ok_or_else(|| anyhow!("model already taken"))
        }
    }

    struct NoDownloads;

    impl Downloader for NoDownloads {
        fn fetch(
            &self,
            _model: &str,
            _filename: &str,
            _cache_dir: &Path,
        ) -> Result<PathBuf, DownloadError> {
            panic!("no download should ever be attempted");
        }
    }

    fn options_with_model(command: &str, model_path: &Path, cache_dir: &Path) -> Options {
        Options {
            command: command.into(),
            model: Some(model_path.to_str().unwrap().into()),
            filename: None,
            n_ctx: 512,
            help_limit: 400,
            cache_dir: cache_dir.to_path_buf(),
        }
    }

    #[test]
    fn summarizes_echo_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("stub.gguf");
        fs::write(&model_path, b"gguf").unwrap();

        let spinner = Spinner::hidden("thinking");
        let model = ScriptedModel::new(echo_chunks(), &spinner);
        let states = Rc::clone(&model.spinner_states);
        let backend = ScriptedBackend::new(model);
        let mut out = Vec::new();

        let options = options_with_model("echo", &model_path, dir.path());
        summarize_command(&backend, &NoDownloads, &options, &spinner, &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "It echoes input.");
        assert_eq!(*states.borrow(), vec![false, false, true, true]);
        assert!(spinner.is_stopped());
    }

    #[test]
    fn nonexistent_command_fails_before_any_completion_request() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("stub.gguf");
        fs::write(&model_path, b"gguf").unwrap();

        let spinner = Spinner::hidden("thinking");
        let model = ScriptedModel::new(echo_chunks(), &spinner);
        let chat_calls = Rc::clone(&model.chat_calls);
        let backend = ScriptedBackend::new(model);
        let mut out = Vec::new();

        let options = options_with_model("helpsum-no-such-command-xyz", &model_path, dir.path());
        let err = summarize_command(&backend, &NoDownloads, &options, &spinner, &mut out)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Help(HelpError::CommandNotFound(_))
        ));
        assert_eq!(err.exit_code(), 5);
        assert_eq!(*chat_calls.borrow(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn nonexistent_model_path_without_filename_is_invalid_and_downloads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.gguf");

        let spinner = Spinner::hidden("thinking");
        let model = ScriptedModel::new(echo_chunks(), &spinner);
        let backend = ScriptedBackend::new(model);
        let mut out = Vec::new();

        let options = options_with_model("echo", &missing, dir.path());
        let err = summarize_command(&backend, &NoDownloads, &options, &spinner, &mut out)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Resolve(ResolveError::InvalidPath { .. })
        ));
        assert_eq!(err.exit_code(), 2);
        assert!(out.is_empty());
    }
}
