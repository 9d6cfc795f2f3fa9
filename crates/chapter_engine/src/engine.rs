use std::sync::{mpsc, Arc};
use std::thread;

use crate::fetch::{ImageFetcher, ReqwestImageFetcher};
use crate::pipeline::{run_chapter, ChannelProgressSink, PipelineSettings};
use crate::{ChapterInput, RunEvent};

enum PipelineCommand {
    Submit { input: ChapterInput },
}

/// Synchronous front door for the upstream page-automation layer: runs
/// chapters on a background runtime and reports progress as events.
pub struct PipelineHandle {
    cmd_tx: mpsc::Sender<PipelineCommand>,
    event_rx: mpsc::Receiver<RunEvent>,
}

impl PipelineHandle {
    pub fn new(settings: PipelineSettings) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let fetcher = Arc::new(ReqwestImageFetcher::new(settings.fetch.clone()));
        let settings = Arc::new(settings);

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            while let Ok(command) = cmd_rx.recv() {
                let fetcher = fetcher.clone();
                let settings = settings.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(fetcher.as_ref(), &settings, command, event_tx).await;
                });
            }
        });

        Self { cmd_tx, event_rx }
    }

    pub fn submit(&self, input: ChapterInput) {
        let _ = self.cmd_tx.send(PipelineCommand::Submit { input });
    }

    pub fn try_recv(&self) -> Option<RunEvent> {
        self.event_rx.try_recv().ok()
    }
}

async fn handle_command(
    fetcher: &dyn ImageFetcher,
    settings: &PipelineSettings,
    command: PipelineCommand,
    event_tx: mpsc::Sender<RunEvent>,
) {
    match command {
        PipelineCommand::Submit { input } => {
            let sink = ChannelProgressSink::new(event_tx.clone());
            let result = run_chapter(fetcher, &input, settings, &sink).await;
            let _ = event_tx.send(RunEvent::Completed {
                result: result.map_err(|err| err.to_string()),
            });
        }
    }
}
