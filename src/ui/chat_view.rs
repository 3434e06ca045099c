use gtk4::prelude::*;
use gtk4 as gtk;
use tradehub::api::models::{Contact, Message, UserId};
use tradehub::composer::{ContentError, MAX_CONTENT_CHARS};
use tradehub::thread::{direction, Direction};

pub struct ChatView {
    root: gtk::Box,
    title: gtk::Label,
    subtitle: gtk::Label,
    placeholder: gtk::Label,
    scroller: gtk::ScrolledWindow,
    messages_box: gtk::Box,
    input_row: gtk::Box,
    entry: gtk::Entry,
    send_btn: gtk::Button,
    field_error: gtk::Label,
    counter: gtk::Label,
}

/// What the composer area should show.
pub struct ComposerView {
    pub draft_len: usize,
    pub error: Option<ContentError>,
    pub can_send: bool,
    pub sending: bool,
}

impl ChatView {
    pub fn new() -> Self {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 6);
        root.set_margin_top(8);
        root.set_margin_bottom(8);
        root.set_margin_start(8);
        root.set_margin_end(8);
        root.set_hexpand(true);

        let title = gtk::Label::new(None);
        title.add_css_class("title-3");
        title.set_halign(gtk::Align::Start);
        let subtitle = gtk::Label::new(None);
        subtitle.add_css_class("dim-label");
        subtitle.set_halign(gtk::Align::Start);
        root.append(&title);
        root.append(&subtitle);

        let placeholder = gtk::Label::new(Some("Select a conversation"));
        placeholder.add_css_class("dim-label");
        placeholder.set_vexpand(true);
        root.append(&placeholder);

        let scroller = gtk::ScrolledWindow::builder()
            .vexpand(true)
            .hexpand(true)
            .build();
        let messages_box = gtk::Box::new(gtk::Orientation::Vertical, 6);
        scroller.set_child(Some(&messages_box));
        root.append(&scroller);

        let input_row = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        let entry = gtk::Entry::new();
        entry.set_hexpand(true);
        entry.set_placeholder_text(Some("Type a message…"));
        let send_btn = gtk::Button::with_label("Send");
        send_btn.add_css_class("suggested-action");
        input_row.append(&entry);
        input_row.append(&send_btn);
        root.append(&input_row);

        let footer = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        let field_error = gtk::Label::new(None);
        field_error.add_css_class("error");
        field_error.set_halign(gtk::Align::Start);
        field_error.set_hexpand(true);
        let counter = gtk::Label::new(None);
        counter.add_css_class("dim-label");
        counter.add_css_class("caption");
        footer.append(&field_error);
        footer.append(&counter);
        root.append(&footer);

        Self {
            root,
            title,
            subtitle,
            placeholder,
            scroller,
            messages_box,
            input_row,
            entry,
            send_btn,
            field_error,
            counter,
        }
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    pub fn connect_draft_changed<F: Fn(String) + 'static>(&self, f: F) {
        self.entry.connect_changed(move |entry| f(entry.text().to_string()));
    }

    pub fn connect_send<F: Fn() + 'static>(&self, f: F) {
        use std::rc::Rc;
        let send: Rc<dyn Fn()> = Rc::new(f);
        {
            let send = send.clone();
            self.send_btn.connect_clicked(move |_| (send)());
        }
        self.entry.connect_activate(move |_| (send)());
    }

    /// `route_id` is the id from the route; `contact` is its directory entry, if any.
    pub fn set_contact(&self, route_id: Option<&str>, contact: Option<&Contact>) {
        match contact {
            Some(c) => {
                self.title.set_label(c.display_name());
                let role = match c.role() {
                    tradehub::api::models::Role::Tradesman => format!("Tradesman · {}", c.full_name),
                    tradehub::api::models::Role::Client => "Client".to_string(),
                };
                self.subtitle.set_label(&role);
                self.placeholder.set_visible(false);
            }
            None => {
                self.title.set_label("");
                self.subtitle.set_label("");
                let text = if route_id.is_some() {
                    "This conversation is not available."
                } else {
                    "Select a conversation"
                };
                self.placeholder.set_label(text);
                self.placeholder.set_visible(true);
            }
        }
        let visible = contact.is_some();
        self.scroller.set_visible(visible);
        self.input_row.set_visible(visible);
        self.field_error.set_visible(visible);
        self.counter.set_visible(visible);
    }

    pub fn set_thread(&self, messages: Option<&[Message]>, loading: bool, error: Option<&str>, me: UserId) {
        while let Some(child) = self.messages_box.first_child() {
            self.messages_box.remove(&child);
        }
        if let Some(message) = error {
            let lbl = gtk::Label::new(Some(&format!("Could not load messages: {}", message)));
            lbl.add_css_class("error");
            self.messages_box.append(&lbl);
            return;
        }
        let Some(messages) = messages else {
            if loading {
                let lbl = gtk::Label::new(Some("Loading messages…"));
                lbl.add_css_class("dim-label");
                self.messages_box.append(&lbl);
            }
            return;
        };
        if messages.is_empty() {
            let lbl = gtk::Label::new(Some("No messages yet. Say hello!"));
            lbl.add_css_class("dim-label");
            self.messages_box.append(&lbl);
            return;
        }
        for msg in messages {
            self.messages_box.append(&bubble(msg, me));
        }
        let adj = self.scroller.vadjustment();
        adj.set_value(adj.upper());
    }

    pub fn set_composer(&self, view: &ComposerView) {
        self.send_btn.set_sensitive(view.can_send);
        self.send_btn.set_label(if view.sending { "Sending…" } else { "Send" });
        self.entry.set_sensitive(!view.sending);
        self.counter.set_label(&format!("{}/{}", view.draft_len, MAX_CONTENT_CHARS));
        match &view.error {
            Some(e @ ContentError::TooLong { .. }) => self.show_field_error(&e.to_string()),
            _ => self.field_error.set_label(""),
        }
    }

    pub fn show_field_error(&self, text: &str) {
        self.field_error.set_label(text);
    }

    /// Shows `text` in the entry, leaving the cursor alone when it is already there.
    pub fn set_entry(&self, text: &str) {
        if self.entry.text().as_str() != text {
            self.entry.set_text(text);
        }
    }

    pub fn focus_entry(&self) {
        self.entry.grab_focus();
    }
}

fn bubble(msg: &Message, me: UserId) -> gtk::Box {
    let outgoing = direction(msg, me) == Direction::Outgoing;
    let bubble = gtk::Box::new(gtk::Orientation::Vertical, 2);
    bubble.set_halign(if outgoing { gtk::Align::End } else { gtk::Align::Start });
    bubble.add_css_class("card");

    let text = gtk::Label::new(Some(&msg.content));
    text.set_wrap(true);
    text.set_selectable(true);
    text.set_xalign(0.0);
    text.set_margin_top(6);
    text.set_margin_start(10);
    text.set_margin_end(10);
    bubble.append(&text);

    let time = msg.created_at.with_timezone(&chrono::Local).format("%b %e, %H:%M").to_string();
    let stamp = gtk::Label::new(Some(&time));
    stamp.add_css_class("caption");
    stamp.add_css_class("dim-label");
    stamp.set_halign(if outgoing { gtk::Align::End } else { gtk::Align::Start });
    stamp.set_margin_bottom(4);
    stamp.set_margin_start(10);
    stamp.set_margin_end(10);
    bubble.append(&stamp);
    bubble
}
