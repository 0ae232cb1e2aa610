use std::time::SystemTime;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::client::{ChatClient, StreamEvent, Turn};
use crate::config::Config;
use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub id: u64,
    pub role: Role,
    pub content: String,
    pub timestamp: SystemTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Pending scroll adjustment, applied once the next render pass has
/// measured the chat viewport. A new intent supersedes a pending one;
/// there is never a queue of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollIntent {
    /// Jump to the bottom unconditionally (a chunk just arrived).
    Follow,
    /// Jump only if the user was already reading the bottom.
    Reveal,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub label: String,

    // Conversation state (append-only; only the open assistant
    // message's content mutates after creation)
    pub messages: Vec<Message>,
    next_message_id: u64,

    // Input state
    pub input: String,
    pub cursor: usize, // cursor position in chars

    // Stream state
    pub loading: bool,
    pub stream_task: Option<JoinHandle<()>>,
    pub on_turn_complete: Option<Box<dyn Fn() + Send>>,

    // Chat viewport (updated during render)
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,
    pub scroll_intent: Option<ScrollIntent>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    client: ChatClient,
    events_tx: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(config: &Config, events_tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            label: config.label.clone(),

            messages: Vec::new(),
            next_message_id: 0,

            input: String::new(),
            cursor: 0,

            loading: false,
            stream_task: None,
            on_turn_complete: None,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            scroll_intent: None,

            animation_frame: 0,

            client: ChatClient::new(&config.endpoint),
            events_tx,
        }
    }

    fn push_message(&mut self, role: Role, content: String) {
        let id = self.next_message_id;
        self.next_message_id += 1;
        self.messages.push(Message {
            id,
            role,
            content,
            timestamp: SystemTime::now(),
        });
    }

    /// Send the current input as a new user turn. Rejected while a
    /// stream is open or when the input trims to nothing.
    pub fn submit(&mut self) {
        let text = self.input.trim().to_string();
        if text.is_empty() || self.loading {
            return;
        }

        self.push_message(Role::User, text);
        self.input.clear();
        self.cursor = 0;
        self.loading = true;
        self.request_scroll(ScrollIntent::Reveal);

        let turns: Vec<Turn> = self
            .messages
            .iter()
            .map(|m| Turn {
                role: m.role,
                content: m.content.clone(),
            })
            .collect();

        let client = self.client.clone();
        let tx = self.events_tx.clone();
        self.stream_task = Some(tokio::spawn(async move {
            client.stream_chat(turns, tx).await;
        }));
    }

    /// Cancel the in-flight stream, keeping whatever partial content has
    /// already arrived. Not an error and fires no notification.
    pub fn stop(&mut self) {
        if let Some(task) = self.stream_task.take() {
            task.abort();
            self.loading = false;
            tracing::debug!("stream cancelled by user");
        }
    }

    pub fn apply_stream(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Opened => {
                if self.loading {
                    self.push_message(Role::Assistant, String::new());
                }
            }
            StreamEvent::Chunk(text) => {
                if !self.loading {
                    // Late chunk from a cancelled stream.
                    return;
                }
                // Chunks that trim to nothing are dropped. This matches
                // the backend contract, at the cost of eating chunks
                // that carried intentional blank lines.
                if text.trim().is_empty() {
                    return;
                }
                if let Some(message) = self
                    .messages
                    .last_mut()
                    .filter(|m| m.role == Role::Assistant)
                {
                    message.content.push_str(&text);
                }
                self.request_scroll(ScrollIntent::Follow);
            }
            StreamEvent::Done => {
                self.finish_stream();
                if let Some(notify) = &self.on_turn_complete {
                    notify();
                }
            }
            StreamEvent::Failed(reason) => {
                tracing::warn!(%reason, "chat stream failed");
                self.finish_stream();
            }
        }
    }

    fn finish_stream(&mut self) {
        self.loading = false;
        self.stream_task = None;
    }

    // Chat scrolling. Manual movement cancels any pending intent so the
    // view does not jump back down under the user.
    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
        self.scroll_intent = None;
    }

    pub fn scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
        self.scroll_intent = None;
    }

    pub fn scroll_half_page_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(self.chat_height / 2);
        self.scroll_intent = None;
    }

    pub fn scroll_half_page_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(self.chat_height / 2);
        self.scroll_intent = None;
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
        self.scroll_intent = None;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.request_scroll(ScrollIntent::Follow);
    }

    pub fn request_scroll(&mut self, intent: ScrollIntent) {
        self.scroll_intent = Some(intent);
    }

    /// Consume the pending intent once the renderer knows the total line
    /// count for the current viewport width.
    pub fn resolve_scroll(&mut self, total_lines: u16) {
        let max_scroll = total_lines.saturating_sub(self.chat_height);
        match self.scroll_intent.take() {
            Some(ScrollIntent::Follow) => self.chat_scroll = max_scroll,
            Some(ScrollIntent::Reveal) => {
                if self.chat_scroll.saturating_add(4) >= max_scroll {
                    self.chat_scroll = max_scroll;
                }
            }
            None => self.chat_scroll = self.chat_scroll.min(max_scroll),
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}
