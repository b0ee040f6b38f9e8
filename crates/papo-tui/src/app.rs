use papo_core::{ChatClient, OptionSet};

use crate::ui;

pub struct App {
    // Core state
    pub should_quit: bool,
    pub client: ChatClient,
    pub endpoint: String,

    // Text entry
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Option set navigation (applies to the newest live set)
    pub option_highlight: usize,

    // Transcript scrolling
    pub chat_scroll: u16,
    pub follow_bottom: bool,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(client: ChatClient, endpoint: &str) -> Self {
        Self {
            should_quit: false,
            client,
            endpoint: endpoint.to_string(),

            input: String::new(),
            cursor: 0,

            option_highlight: 0,

            chat_scroll: 0,
            follow_bottom: true,
            chat_height: 0,
            chat_width: 0,

            animation_frame: 0,
        }
    }

    pub fn latest_options(&self) -> Option<&OptionSet> {
        self.client.transcript().latest_options()
    }

    pub fn is_waiting(&self) -> bool {
        self.client.transcript().pending_count() > 0
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_waiting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn option_down(&mut self) {
        if let Some(len) = self.latest_options().map(|set| set.choices.len()) {
            if len > 0 {
                self.option_highlight = (self.option_highlight + 1).min(len - 1);
            }
        }
    }

    pub fn option_up(&mut self) {
        self.option_highlight = self.option_highlight.saturating_sub(1);
    }

    /// Keep the highlight inside the newest option set after it changes
    pub fn clamp_option_highlight(&mut self) {
        let len = self.latest_options().map(|set| set.choices.len()).unwrap_or(0);
        if self.option_highlight >= len {
            self.option_highlight = len.saturating_sub(1);
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_bottom = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
        self.follow_bottom = self.chat_scroll >= max;
    }

    /// Scroll chat to bottom so the newest entry is visible
    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = self.max_scroll();
        self.follow_bottom = true;
    }

    fn max_scroll(&self) -> u16 {
        self.total_chat_lines().saturating_sub(self.chat_height)
    }

    /// Number of rendered rows of the transcript at the current width
    pub fn total_chat_lines(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 { self.chat_width } else { 50 };

        let rows = ui::chat_paragraph(self).line_count(wrap_width);
        u16::try_from(rows).unwrap_or(u16::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use papo_core::{ChatReply, HttpTransport, MemoryStore};
    use std::sync::Arc;

    fn app() -> App {
        let transport = Arc::new(HttpTransport::new("http://127.0.0.1:9/chat"));
        let client = ChatClient::new(transport, Box::new(MemoryStore::new()));
        App::new(client, "http://127.0.0.1:9/chat")
    }

    fn app_with_options(choices: &[&str]) -> App {
        let mut app = app();
        let pending = app.client.begin_send(&mut "oi".to_string(), None).unwrap();
        app.client.resolve(
            pending.id,
            Ok(ChatReply::reply("Escolha").with_options(choices.iter().copied())),
        );
        app
    }

    #[test]
    fn test_option_highlight_stays_in_range() {
        let mut app = app_with_options(&["A", "B"]);
        app.option_down();
        app.option_down();
        assert_eq!(app.option_highlight, 1);
        app.option_up();
        app.option_up();
        assert_eq!(app.option_highlight, 0);
    }

    #[test]
    fn test_clamp_after_options_removed() {
        let mut app = app_with_options(&["A", "B", "C"]);
        app.option_highlight = 2;
        let set = app.latest_options().unwrap().id;
        app.client.choose_option(set, 2);
        app.clamp_option_highlight();
        assert_eq!(app.option_highlight, 0);
    }

    #[test]
    fn test_tick_only_animates_while_waiting() {
        let mut app = app();
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);

        app.client.begin_send(&mut "oi".to_string(), None);
        app.tick_animation();
        app.tick_animation();
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);
        app.tick_animation();
        assert_eq!(app.animation_frame, 1);
    }

    #[test]
    fn test_total_lines_counts_wrapping() {
        let mut app = app();
        app.chat_width = 10;
        let pending = app.client.begin_send(&mut "a".repeat(25), None).unwrap();
        app.client.resolve(pending.id, Ok(ChatReply::reply("ok")));
        // user: role + 3 wrapped + blank; bot: role + 1 + blank
        assert_eq!(app.total_chat_lines(), 8);
    }

    #[test]
    fn test_total_lines_wraps_on_words() {
        let mut app = app();
        app.chat_width = 10;
        let pending = app.client.begin_send(&mut "oi".to_string(), None).unwrap();
        app.client
            .resolve(pending.id, Ok(ChatReply::reply("aaaa bbbbbbbb cc")));
        // "aaaa " / "bbbbbbbb " / "cc" on three rows, not two
        assert_eq!(app.total_chat_lines(), 8);
    }

    #[test]
    fn test_total_lines_saturates_on_huge_reply() {
        let mut app = app();
        app.chat_width = 40;
        app.chat_height = 20;
        let pending = app.client.begin_send(&mut "oi".to_string(), None).unwrap();
        app.client
            .resolve(pending.id, Ok(ChatReply::reply("x\n".repeat(70_000))));

        assert_eq!(app.total_chat_lines(), u16::MAX);
        app.scroll_to_bottom();
        assert_eq!(app.chat_scroll, u16::MAX - 20);
    }
}
