use std::sync::Arc;
use std::time::Duration;
use anyhow::Result;
use ratatui::layout::Rect;
use tracing::{debug, error, info, warn};

use crate::completion::{CompletionClient, CompletionMessage, CompletionRequest};
use crate::persona::ChatRoute;
use crate::state::{history_key, Message, Sender};
use crate::store::KeyValueStore;

pub const FALLBACK_REPLY: &str = "Sorry, I couldn't process your request.";

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Call the endpoint, then hold the reply for at least `min_display_latency`.
pub async fn await_reply(
    client: Arc<dyn CompletionClient>,
    request: CompletionRequest,
    min_display_latency: Duration,
) -> Result<String> {
    let reply = client.complete(request).await;
    if !min_display_latency.is_zero() {
        tokio::time::sleep(min_display_latency).await;
    }
    reply
}

/// Read a persona's stored conversation. Missing or unreadable history is
/// an empty conversation.
pub fn load_history(store: &dyn KeyValueStore, title: &str) -> Vec<Message> {
    let key = history_key(title);
    match store.get(&key) {
        Ok(Some(raw)) => match serde_json::from_str::<Vec<Message>>(&raw) {
            Ok(messages) => messages,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to parse chat history");
                Vec::new()
            }
        },
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!(key = %key, error = %e, "Failed to load chat history");
            Vec::new()
        }
    }
}

/// One persona's conversation, from mount to unmount.
pub struct ChatSession {
    pub title: String,
    prompt: String,
    model: String,
    messages: Vec<Message>,
    store: Arc<dyn KeyValueStore>,

    // Input box
    pub input: String,
    pub cursor: usize,

    // Typing indicator
    pub awaiting_response: bool,
    pub typing_frame: u8, // 0-2, which of the three dots is raised

    // View state, updated during render
    pub scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,
    pub send_area: Option<Rect>,
}

impl ChatSession {
    /// Mount: restore history for `route.title`, starting empty if there is
    /// none or it can't be read.
    pub fn open(route: ChatRoute, model: &str, store: Arc<dyn KeyValueStore>) -> Self {
        let messages = load_history(store.as_ref(), &route.title);
        info!(title = %route.title, restored = messages.len(), "Chat session opened");

        let session = Self {
            title: route.title,
            prompt: route.prompt,
            model: model.to_string(),
            messages,
            store,
            input: String::new(),
            cursor: 0,
            awaiting_response: false,
            typing_frame: 0,
            scroll: 0,
            chat_height: 0,
            chat_width: 0,
            send_area: None,
        };
        session.persist();
        session
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn storage_key(&self) -> String {
        history_key(&self.title)
    }

    /// Take the input box contents as a user message.
    ///
    /// Returns the request to send, or `None` when the input is blank or a
    /// reply is still pending (the input is left untouched in that case).
    pub fn submit(&mut self) -> Option<CompletionRequest> {
        if self.input.trim().is_empty() || self.awaiting_response {
            return None;
        }

        let text = std::mem::take(&mut self.input);
        self.cursor = 0;

        let request = self.build_request(&text);
        self.append(text, Sender::User);
        self.awaiting_response = true;
        self.typing_frame = 0;
        self.scroll_to_bottom();

        Some(request)
    }

    /// Settle the pending exchange with the endpoint's result.
    pub fn receive(&mut self, reply: Result<String>) {
        let text = match reply {
            Ok(content) => content,
            Err(e) => {
                error!(title = %self.title, error = %e, "Error fetching completion");
                FALLBACK_REPLY.to_string()
            }
        };
        self.append(text, Sender::Bot);
        self.awaiting_response = false;
        self.scroll_to_bottom();
    }

    /// Submit and settle in one go, without a UI loop around it.
    ///
    /// Returns `false` if nothing was sent.
    pub async fn exchange(
        &mut self,
        client: Arc<dyn CompletionClient>,
        min_display_latency: Duration,
    ) -> bool {
        let Some(request) = self.submit() else {
            return false;
        };
        let reply = await_reply(client, request, min_display_latency).await;
        self.receive(reply);
        true
    }

    pub fn clear_history(&mut self) {
        self.messages.clear();
        self.scroll = 0;
        self.persist();
    }

    fn build_request(&self, text: &str) -> CompletionRequest {
        let mut messages = Vec::with_capacity(self.messages.len() + 2);
        messages.push(CompletionMessage::new("system", &self.prompt));
        for msg in &self.messages {
            messages.push(CompletionMessage::new(msg.sender.role(), &msg.text));
        }
        messages.push(CompletionMessage::new("user", text));

        debug!(title = %self.title, turns = messages.len(), "Built completion request");
        CompletionRequest {
            model: self.model.clone(),
            messages,
        }
    }

    fn append(&mut self, text: String, sender: Sender) {
        let message = Message::new(text, sender, self.messages.last());
        self.messages.push(message);
        self.persist();
    }

    fn persist(&self) {
        let key = self.storage_key();
        let result = serde_json::to_string(&self.messages)
            .map_err(anyhow::Error::from)
            .and_then(|raw| self.store.set(&key, &raw));
        if let Err(e) = result {
            warn!(key = %key, error = %e, "Failed to save chat history");
        }
    }

    // Input editing

    pub fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
        self.cursor = self.input.chars().count();
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    // View helpers

    /// Advance the typing dots (called on each tick).
    pub fn tick(&mut self) {
        if self.awaiting_response {
            self.typing_frame = (self.typing_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.total_lines().saturating_sub(self.visible_height());
        self.scroll = self.scroll.saturating_add(lines).min(max);
    }

    /// Keep the newest message (and the typing dots) in view.
    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.total_lines().saturating_sub(self.visible_height());
    }

    fn visible_height(&self) -> u16 {
        if self.chat_height > 0 { self.chat_height } else { 20 }
    }

    fn total_lines(&self) -> u16 {
        let width = bubble_text_width(self.chat_width);
        let mut total: usize = 0;
        for msg in &self.messages {
            total += msg.text.lines().map(|l| wrap_line(l, width).len()).sum::<usize>().max(1);
            total += 1; // Blank line after message
        }
        if self.awaiting_response {
            total += 1;
        }
        total.min(u16::MAX as usize) as u16
    }
}

/// Text columns inside a bubble; bubbles take at most 80% of the chat width.
pub fn bubble_text_width(chat_width: u16) -> usize {
    if chat_width == 0 {
        return 40;
    }
    (chat_width as usize * 4 / 5).saturating_sub(2).max(1)
}

/// Greedy word wrap by character count. Words longer than `width` are split.
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in line.split(' ') {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if current_len > 0 {
                rows.push(std::mem::take(&mut current));
                current_len = 0;
            }
            rows.push(word.drain(..width).collect());
        }

        let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
        if needed > width && current_len > 0 {
            rows.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }

    if current_len > 0 || rows.is_empty() {
        rows.push(current);
    }
    rows
}
