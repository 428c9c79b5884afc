use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::completion::CompletionClient;
use crate::launcher::{Launcher, LauncherConfig, LauncherEvent};
use crate::menu::Menu;
use crate::persona::ChatRoute;
use crate::session::{await_reply, ChatSession};
use crate::store::KeyValueStore;

pub const APP_TITLE: &str = "Persona Chat";

/// Routes on the navigation stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Options,
    AIChatPage,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    stack: Vec<Screen>,

    // Screens
    pub launcher: Launcher,
    pub menu: Menu,
    pub chat: Option<ChatSession>,
    pending_reply: Option<JoinHandle<anyhow::Result<String>>>,

    // Collaborators
    client: Arc<dyn CompletionClient>,
    store: Arc<dyn KeyValueStore>,
    pub model: String,
    min_display_latency: Duration,
}

impl App {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        store: Arc<dyn KeyValueStore>,
        model: &str,
        min_display_latency: Duration,
        launcher: LauncherConfig,
    ) -> Self {
        Self {
            should_quit: false,
            stack: vec![Screen::Home],
            launcher: Launcher::new(launcher),
            menu: Menu::new(),
            chat: None,
            pending_reply: None,
            client,
            store,
            model: model.to_string(),
            min_display_latency,
        }
    }

    pub fn screen(&self) -> Screen {
        self.stack.last().copied().unwrap_or(Screen::Home)
    }

    pub fn can_go_back(&self) -> bool {
        self.stack.len() > 1
    }

    /// Text for the title bar, set by whichever screen is on top.
    pub fn header_title(&self) -> String {
        match self.screen() {
            Screen::Home => APP_TITLE.to_string(),
            Screen::Options => "AI".to_string(),
            Screen::AIChatPage => self
                .chat
                .as_ref()
                .map(|c| c.title.clone())
                .unwrap_or_default(),
        }
    }

    pub fn on_launcher_event(&mut self, event: LauncherEvent) {
        match event {
            LauncherEvent::Activated => self.open_menu(),
        }
    }

    pub fn open_menu(&mut self) {
        if self.screen() != Screen::Options {
            debug!("Navigate to Options");
            self.stack.push(Screen::Options);
        }
    }

    pub fn open_chat(&mut self, route: ChatRoute) {
        self.discard_pending_reply();
        info!(title = %route.title, "Navigate to AIChatPage");
        self.chat = Some(ChatSession::open(route, &self.model, Arc::clone(&self.store)));
        self.stack.push(Screen::AIChatPage);
    }

    /// Open the chat for whatever the menu has highlighted.
    pub fn choose_persona(&mut self) {
        if let Some(route) = self.menu.choose() {
            self.open_chat(route);
        }
    }

    /// Pop one screen. Leaving the chat unmounts it and drops any reply
    /// still on its way.
    pub fn back(&mut self) {
        if !self.can_go_back() {
            return;
        }
        if self.stack.pop() == Some(Screen::AIChatPage) {
            self.discard_pending_reply();
            self.chat = None;
        }
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.pending_reply.is_some()
    }

    /// Send the chat input, if the session accepts it.
    pub fn submit_message(&mut self) {
        let Some(chat) = self.chat.as_mut() else {
            return;
        };
        let Some(request) = chat.submit() else {
            return;
        };

        let client = Arc::clone(&self.client);
        let latency = self.min_display_latency;
        self.pending_reply = Some(tokio::spawn(async move {
            await_reply(client, request, latency).await
        }));
    }

    /// Hand a finished reply to the chat session.
    pub async fn poll_reply(&mut self) {
        let finished = self
            .pending_reply
            .as_ref()
            .map(|h| h.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(handle) = self.pending_reply.take() {
            let reply = match handle.await {
                Ok(reply) => reply,
                Err(e) => Err(anyhow::anyhow!("completion task failed: {}", e)),
            };
            if let Some(chat) = self.chat.as_mut() {
                chat.receive(reply);
            }
        }
    }

    /// Called on every animation tick.
    pub async fn tick(&mut self) {
        if let Some(chat) = self.chat.as_mut() {
            chat.tick();
        }
        self.poll_reply().await;
    }

    fn discard_pending_reply(&mut self) {
        if let Some(handle) = self.pending_reply.take() {
            debug!("Discarding pending reply");
            handle.abort();
        }
    }
}
