use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Notify};
use tokio::time::timeout;

use nvim_jump::config::ServerConfig;
use nvim_jump::editor::{EditorConnector, EditorSession};
use nvim_jump::error::{BridgeError, Result as BridgeResult};
use nvim_jump::server::{self, ServerHandle};

/// Fake editor that reports every RPC call on a channel.
///
/// `bufnr`/`bufloaded`/`bufwinnr` answers are fixed; the first `refuse_connects`
/// connection attempts fail. With `stall` set, `bufnr` waits on it before answering.
struct RecordingEditor {
    calls: mpsc::UnboundedSender<String>,
    buf_nr: i64,
    loaded: i64,
    win_nr: i64,
    refuse_connects: AtomicUsize,
    stall: Option<Arc<Notify>>,
}

struct RecordingSession {
    calls: mpsc::UnboundedSender<String>,
    buf_nr: i64,
    loaded: i64,
    win_nr: i64,
    stall: Option<Arc<Notify>>,
}

impl EditorConnector for RecordingEditor {
    type Session = RecordingSession;

    async fn connect(&self) -> BridgeResult<RecordingSession> {
        let refused = self
            .refuse_connects
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            let _ = self.calls.send("connect refused".to_string());
            return Err(BridgeError::editor("connect", "connection refused"));
        }

        let _ = self.calls.send("connect".to_string());
        Ok(RecordingSession {
            calls: self.calls.clone(),
            buf_nr: self.buf_nr,
            loaded: self.loaded,
            win_nr: self.win_nr,
            stall: self.stall.clone(),
        })
    }
}

impl EditorSession for RecordingSession {
    async fn eval(&mut self, expr: &str) -> BridgeResult<i64> {
        let _ = self.calls.send(expr.to_string());
        if expr.starts_with("bufnr(") {
            if let Some(stall) = &self.stall {
                stall.notified().await;
            }
            Ok(self.buf_nr)
        } else if expr.starts_with("bufloaded(") {
            Ok(self.loaded)
        } else if expr.starts_with("bufwinnr(") {
            Ok(self.win_nr)
        } else {
            Err(BridgeError::editor(expr, "unexpected expression"))
        }
    }

    async fn command(&mut self, command: &str) -> BridgeResult<()> {
        let _ = self.calls.send(command.to_string());
        Ok(())
    }
}

async fn start_server(
    buf_nr: i64,
    loaded: i64,
    win_nr: i64,
    refuse_connects: usize,
) -> (ServerHandle, mpsc::UnboundedReceiver<String>) {
    start_server_with(buf_nr, loaded, win_nr, refuse_connects, None).await
}

async fn start_server_with(
    buf_nr: i64,
    loaded: i64,
    win_nr: i64,
    refuse_connects: usize,
    stall: Option<Arc<Notify>>,
) -> (ServerHandle, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let editor = RecordingEditor {
        calls: tx,
        buf_nr,
        loaded,
        win_nr,
        refuse_connects: AtomicUsize::new(refuse_connects),
        stall,
    };
    let config = ServerConfig {
        listen: "127.0.0.1:0".parse().unwrap(),
        read_timeout_secs: 5,
        max_request_length: 1024,
    };

    let handle = server::start(&config, editor).await.unwrap();
    (handle, rx)
}

async fn send_request(handle: &ServerHandle, line: &[u8]) {
    let mut stream = TcpStream::connect(handle.local_addr()).await.unwrap();
    stream.write_all(line).await.unwrap();
    stream.shutdown().await.unwrap();
}

async fn next_call(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for an editor call")
        .expect("editor channel closed")
}

async fn collect_calls(rx: &mut mpsc::UnboundedReceiver<String>, count: usize) -> Vec<String> {
    let mut calls = Vec::with_capacity(count);
    for _ in 0..count {
        calls.push(next_call(rx).await);
    }
    calls
}

#[tokio::test]
async fn test_open_file_not_yet_loaded() {
    let (handle, mut rx) = start_server(-1, 0, 0, 0).await;

    send_request(&handle, b"C:\\foo\\bar.txt:10:5\n").await;

    let calls = collect_calls(&mut rx, 5).await;
    assert_eq!(
        calls,
        vec![
            "connect",
            "bufnr('C:\\foo\\bar.txt')",
            "bufloaded(-1)",
            "execute 'edit ' . fnameescape('C:\\foo\\bar.txt')",
            "call cursor(10, 5)",
        ]
    );

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_visible_file_switches_window() {
    let (handle, mut rx) = start_server(7, 1, 3, 0).await;

    send_request(&handle, b"/home/me/src/lib.rs:42:8\n").await;

    let calls = collect_calls(&mut rx, 6).await;
    assert_eq!(
        calls,
        vec![
            "connect",
            "bufnr('/home/me/src/lib.rs')",
            "bufloaded(7)",
            "bufwinnr(7)",
            "3wincmd w",
            "call cursor(42, 8)",
        ]
    );
    assert!(!calls.iter().any(|c| c.contains("edit")));

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_malformed_request_never_reaches_editor() {
    let (handle, mut rx) = start_server(-1, 0, 0, 0).await;

    send_request(&handle, b"C:\\a:b\n").await;
    // A well-formed request afterwards proves the server is still serving, and
    // its `connect` must be the very first editor call observed.
    send_request(&handle, b"C:\\ok.txt:1:1\n").await;

    let calls = collect_calls(&mut rx, 2).await;
    assert_eq!(calls, vec!["connect", "bufnr('C:\\ok.txt')"]);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_editor_failure_does_not_stop_listener() {
    let (handle, mut rx) = start_server(-1, 0, 0, 1).await;

    send_request(&handle, b"C:\\first.txt:1:1\n").await;
    assert_eq!(next_call(&mut rx).await, "connect refused");

    send_request(&handle, b"C:\\second.txt:2:3\n").await;
    let calls = collect_calls(&mut rx, 5).await;
    assert_eq!(calls[0], "connect");
    assert_eq!(calls[1], "bufnr('C:\\second.txt')");
    assert_eq!(calls[4], "call cursor(2, 3)");

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let (handle, _rx) = start_server(-1, 0, 0, 0).await;
    let addr = handle.local_addr();

    handle.shutdown().await.unwrap();

    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_dropping_handle_stops_accepting() {
    let (handle, _rx) = start_server(-1, 0, 0, 0).await;
    let addr = handle.local_addr();

    drop(handle);

    // The accept loop exits asynchronously after the drop signal.
    let mut refused = false;
    for _ in 0..100 {
        if TcpStream::connect(addr).await.is_err() {
            refused = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(refused, "listener still accepting after its handle was dropped");
}

#[tokio::test]
async fn test_shutdown_abandons_request_in_flight() {
    let stall = Arc::new(Notify::new());
    let (handle, mut rx) = start_server_with(-1, 0, 0, 0, Some(stall.clone())).await;

    send_request(&handle, b"C:\\slow.txt:4:2\n").await;
    assert_eq!(collect_calls(&mut rx, 2).await, vec!["connect", "bufnr('C:\\slow.txt')"]);

    timeout(Duration::from_secs(5), handle.shutdown())
        .await
        .expect("shutdown hung on a stalled editor call")
        .unwrap();

    // Every sender is gone once the abandoned handler has returned.
    let mut remaining = Vec::new();
    timeout(Duration::from_secs(5), async {
        while let Some(call) = rx.recv().await {
            remaining.push(call);
        }
    })
    .await
    .expect("handler kept its session open after shutdown");

    assert!(!remaining.iter().any(|c| c.starts_with("call cursor")), "{:?}", remaining);
}
