use futures_util::stream::Stream;
use serde::Serialize;
use serde_json::Value;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{UploadError, UploadResult};

/// Bytes do arquivo já entregues ao transporte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub loaded: u64,
    pub total: u64,
    /// `total` é sempre o tamanho declarado do corpo do arquivo
    pub total_known: bool,
}

impl ProgressEvent {
    pub fn new(loaded: u64, total: u64) -> Self {
        Self {
            loaded,
            total,
            total_known: true,
        }
    }

    /// Percentual concluído (0-100); envio de arquivo vazio conta como 100
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.loaded as f64 / self.total as f64) * 100.0
        }
    }

    pub fn is_complete(&self) -> bool {
        self.loaded >= self.total
    }
}

/// Evento de um upload em andamento.
///
/// Uma sequência é sempre zero ou mais `Progress` seguidos de exatamente um
/// evento terminal (`Completed` ou `Failed`).
#[derive(Debug)]
pub enum UploadEvent {
    Progress(ProgressEvent),
    Completed(Value),
    Failed(UploadError),
}

impl UploadEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, UploadEvent::Progress(_))
    }
}

/// Handle de um upload iniciado com `DriveClient::start_upload`.
///
/// Também é um `Stream<Item = UploadEvent>` que termina após o evento terminal.
#[derive(Debug)]
pub struct UploadHandle {
    events: mpsc::UnboundedReceiver<UploadEvent>,
    task: JoinHandle<()>,
    finished: bool,
}

impl UploadHandle {
    pub(crate) fn new(events: mpsc::UnboundedReceiver<UploadEvent>, task: JoinHandle<()>) -> Self {
        Self {
            events,
            task,
            finished: false,
        }
    }

    /// Próximo evento; `None` depois do evento terminal ou do cancelamento
    pub async fn next_event(&mut self) -> Option<UploadEvent> {
        if self.finished {
            return None;
        }

        let event = self.events.recv().await;
        self.observe(&event);
        event
    }

    /// Aborta a requisição em andamento
    pub fn cancel(&self) {
        tracing::info!("🛑 Upload cancelado pelo chamador");
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.finished || self.task.is_finished()
    }

    /// Consome os eventos restantes e devolve o resultado final
    pub async fn wait(mut self) -> UploadResult<Value> {
        while let Some(event) = self.next_event().await {
            match event {
                UploadEvent::Progress(_) => continue,
                UploadEvent::Completed(value) => return Ok(value),
                UploadEvent::Failed(error) => return Err(error),
            }
        }

        Err(UploadError::transport("upload cancelled"))
    }

    fn observe(&mut self, event: &Option<UploadEvent>) {
        match event {
            Some(event) if !event.is_terminal() => {}
            _ => self.finished = true,
        }
    }
}

impl Stream for UploadHandle {
    type Item = UploadEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        match self.events.poll_recv(cx) {
            Poll::Ready(event) => {
                self.observe(&event);
                Poll::Ready(event)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[test]
    fn test_progress_percent() {
        assert_eq!(ProgressEvent::new(50, 200).percent(), 25.0);
        assert_eq!(ProgressEvent::new(0, 0).percent(), 100.0);
        assert!(ProgressEvent::new(200, 200).is_complete());
        assert!(!ProgressEvent::new(199, 200).is_complete());
    }

    #[test]
    fn test_terminal_events() {
        assert!(!UploadEvent::Progress(ProgressEvent::new(1, 2)).is_terminal());
        assert!(UploadEvent::Completed(Value::Null).is_terminal());
        assert!(UploadEvent::Failed(UploadError::transport("x")).is_terminal());
    }

    #[tokio::test]
    async fn test_handle_stops_after_terminal_event() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(UploadEvent::Progress(ProgressEvent::new(1, 2))).unwrap();
        tx.send(UploadEvent::Completed(serde_json::json!({"id": "x"}))).unwrap();
        tx.send(UploadEvent::Progress(ProgressEvent::new(2, 2))).unwrap();

        let mut handle = UploadHandle::new(rx, tokio::spawn(async {}));

        assert!(matches!(handle.next_event().await, Some(UploadEvent::Progress(_))));
        assert!(matches!(handle.next_event().await, Some(UploadEvent::Completed(_))));
        assert!(handle.next_event().await.is_none());
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn test_wait_without_terminal_event_is_cancellation() {
        let (tx, rx) = mpsc::unbounded_channel::<UploadEvent>();
        drop(tx);

        let handle = UploadHandle::new(rx, tokio::spawn(async {}));
        let error = handle.wait().await.unwrap_err();
        assert_eq!(error.to_string(), "Failed to upload file: upload cancelled");
    }

    #[tokio::test]
    async fn test_stream_ends_after_terminal_event() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(UploadEvent::Progress(ProgressEvent::new(1, 2))).unwrap();
        tx.send(UploadEvent::Completed(serde_json::json!({"id": "x"}))).unwrap();
        tx.send(UploadEvent::Progress(ProgressEvent::new(2, 2))).unwrap();

        let handle = UploadHandle::new(rx, tokio::spawn(async {}));
        let events: Vec<UploadEvent> = handle.collect().await;

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], UploadEvent::Progress(p) if p.loaded == 1));
        assert!(matches!(events[1], UploadEvent::Completed(_)));
    }
}
