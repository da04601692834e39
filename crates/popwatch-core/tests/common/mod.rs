//! A small in-process POP3 server for poller tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use popwatch_core::{KnownUidStore, KnownUids, MemoryStateStore, PollerConfig, Result};

pub const PASSWORD: &str = "s3cret";

#[derive(Default)]
struct Mailbox {
    messages: Vec<(String, String)>,
    failing_retr: HashSet<String>,
    failing_dele: HashSet<String>,
    retrieved: Vec<String>,
    greeting_delay: Duration,
    connections: usize,
}

/// Serves any number of sequential or concurrent sessions over one
/// shared mailbox. Deletions take effect on QUIT.
#[derive(Clone)]
pub struct FakeServer {
    port: u16,
    mailbox: Arc<Mutex<Mailbox>>,
}

impl FakeServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let mailbox = Arc::new(Mutex::new(Mailbox::default()));

        let shared = Arc::clone(&mailbox);
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(handle(socket, Arc::clone(&shared)));
            }
        });

        Self { port, mailbox }
    }

    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Adds a message with a generated body.
    pub fn add(&self, uid: &str) {
        self.mailbox
            .lock()
            .unwrap()
            .messages
            .push((uid.to_string(), body_for(uid)));
    }

    /// Makes RETR of `uid` answer -ERR.
    pub fn fail_retrieve(&self, uid: &str) {
        self.mailbox
            .lock()
            .unwrap()
            .failing_retr
            .insert(uid.to_string());
    }

    /// Makes DELE of `uid` answer -ERR.
    pub fn fail_delete(&self, uid: &str) {
        self.mailbox
            .lock()
            .unwrap()
            .failing_dele
            .insert(uid.to_string());
    }

    /// UIDs successfully retrieved so far, in order, across all sessions.
    pub fn retrieved(&self) -> Vec<String> {
        self.mailbox.lock().unwrap().retrieved.clone()
    }

    pub fn set_greeting_delay(&self, delay: Duration) {
        self.mailbox.lock().unwrap().greeting_delay = delay;
    }

    pub fn uids(&self) -> Vec<String> {
        self.mailbox
            .lock()
            .unwrap()
            .messages
            .iter()
            .map(|(uid, _)| uid.clone())
            .collect()
    }

    pub fn connections(&self) -> usize {
        self.mailbox.lock().unwrap().connections
    }

    /// Poller configuration pointing at this server.
    pub fn config(&self) -> PollerConfig {
        PollerConfig {
            port: Some(self.port),
            secure: false,
            timeout_secs: 5,
            ..PollerConfig::new("127.0.0.1", "alice", PASSWORD)
        }
    }
}

pub fn body_for(uid: &str) -> String {
    format!("Subject: {uid}\r\n\r\nbody of {uid}")
}

async fn handle(socket: TcpStream, mailbox: Arc<Mutex<Mailbox>>) {
    let delay = {
        let mut mailbox = mailbox.lock().unwrap();
        mailbox.connections += 1;
        mailbox.greeting_delay
    };
    tokio::time::sleep(delay).await;

    let (read, mut write) = socket.into_split();
    let mut reader = BufReader::new(read);
    let snapshot = mailbox.lock().unwrap().messages.clone();
    let mut deleted = HashSet::new();

    if write.write_all(b"+OK fake pop3 ready\r\n").await.is_err() {
        return;
    }

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
            return;
        }
        let line = line.trim_end();
        let (verb, arg) = line.split_once(' ').unwrap_or((line, ""));
        let message = arg
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| snapshot.get(i));

        let reply = match (verb, message) {
            ("USER", _) => "+OK\r\n".to_string(),
            ("PASS", _) if arg == PASSWORD => "+OK logged in\r\n".to_string(),
            ("PASS", _) => "-ERR invalid password\r\n".to_string(),
            ("UIDL", _) => {
                let mut reply = String::from("+OK\r\n");
                for (i, (uid, _)) in snapshot.iter().enumerate() {
                    reply.push_str(&format!("{} {uid}\r\n", i + 1));
                }
                reply.push_str(".\r\n");
                reply
            }
            ("RETR", Some((uid, body))) => {
                let mut mailbox = mailbox.lock().unwrap();
                if mailbox.failing_retr.contains(uid) {
                    "-ERR cannot read message\r\n".to_string()
                } else {
                    mailbox.retrieved.push(uid.clone());
                    format!("+OK\r\n{body}\r\n.\r\n")
                }
            }
            ("DELE", Some((uid, _))) => {
                if mailbox.lock().unwrap().failing_dele.contains(uid) {
                    "-ERR cannot delete message\r\n".to_string()
                } else {
                    deleted.insert(uid.clone());
                    "+OK deleted\r\n".to_string()
                }
            }
            ("QUIT", _) => {
                mailbox
                    .lock()
                    .unwrap()
                    .messages
                    .retain(|(uid, _)| !deleted.contains(uid));
                let _ = write.write_all(b"+OK bye\r\n").await;
                return;
            }
            _ => "-ERR no such message\r\n".to_string(),
        };

        if write.write_all(reply.as_bytes()).await.is_err() {
            return;
        }
    }
}

/// Memory store that counts loads and saves.
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryStateStore,
    pub loads: AtomicUsize,
    pub saves: AtomicUsize,
}

impl CountingStore {
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl KnownUidStore for CountingStore {
    async fn load(&self, mailbox: &str) -> Result<KnownUids> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load(mailbox).await
    }

    async fn save(&self, mailbox: &str, state: &KnownUids) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(mailbox, state).await
    }
}
