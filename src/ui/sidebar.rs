use gtk4::prelude::*;
use gtk4 as gtk;
use std::cell::RefCell;
use std::rc::Rc;
use tradehub::api::models::{Contact, Role, UserId};
use tradehub::directory::DirectoryState;

const PREVIEW_CHARS: usize = 48;

pub struct Sidebar {
    root: gtk::Box,
    list: gtk::ListBox,
    status: gtk::Label,
    ids: Rc<RefCell<Vec<UserId>>>,
}

impl Sidebar {
    pub fn new() -> Self {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 6);
        root.set_margin_top(8);
        root.set_margin_bottom(8);
        root.set_margin_start(8);
        root.set_margin_end(8);
        root.set_width_request(280);

        let title = gtk::Label::new(Some("Messages"));
        title.add_css_class("heading");
        title.set_halign(gtk::Align::Start);
        root.append(&title);

        let status = gtk::Label::new(None);
        status.set_halign(gtk::Align::Start);
        status.set_wrap(true);
        root.append(&status);

        let list = gtk::ListBox::new();
        list.set_selection_mode(gtk::SelectionMode::Single);
        list.add_css_class("navigation-sidebar");
        let scroller = gtk::ScrolledWindow::builder().vexpand(true).child(&list).build();
        root.append(&scroller);

        Self { root, list, status, ids: Rc::new(RefCell::new(Vec::new())) }
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    /// Called with the contact id when the user activates a row.
    pub fn connect_selected<F: Fn(UserId) + 'static>(&self, f: F) {
        let ids = self.ids.clone();
        self.list.connect_row_activated(move |_, row| {
            let idx = row.index();
            let id = usize::try_from(idx).ok().and_then(|i| ids.borrow().get(i).copied());
            if let Some(id) = id {
                f(id);
            }
        });
    }

    pub fn set_state(&self, state: &DirectoryState, active: Option<UserId>, me: UserId) {
        match state {
            DirectoryState::Disabled => self.show_status("Sign in to see your messages.", false),
            DirectoryState::Loading => self.show_status("Loading conversations…", false),
            DirectoryState::Failed(message) => {
                self.show_status(&format!("Could not load conversations: {}", message), true)
            }
            DirectoryState::Loaded(list) if list.is_empty() => self.show_status("No conversations yet.", false),
            DirectoryState::Loaded(_) => self.status.set_visible(false),
        }
        let contacts: &[Contact] = state.contacts().unwrap_or(&[]);
        self.set_items(contacts, active, me);
    }

    fn show_status(&self, text: &str, error: bool) {
        self.status.set_label(text);
        self.status.set_visible(true);
        if error {
            self.status.remove_css_class("dim-label");
            self.status.add_css_class("error");
        } else {
            self.status.remove_css_class("error");
            self.status.add_css_class("dim-label");
        }
    }

    fn set_items(&self, contacts: &[Contact], active: Option<UserId>, me: UserId) {
        while let Some(child) = self.list.first_child() {
            self.list.remove(&child);
        }
        let mut ids = self.ids.borrow_mut();
        ids.clear();
        for contact in contacts {
            let row = gtk::ListBoxRow::new();
            row.set_child(Some(&contact_row(contact, me)));
            self.list.append(&row);
            if Some(contact.id) == active {
                self.list.select_row(Some(&row));
            }
            ids.push(contact.id);
        }
    }
}

fn contact_row(contact: &Contact, me: UserId) -> gtk::Box {
    let row = gtk::Box::new(gtk::Orientation::Horizontal, 8);
    row.set_margin_top(6);
    row.set_margin_bottom(6);
    row.set_margin_start(6);
    row.set_margin_end(6);

    let text = gtk::Box::new(gtk::Orientation::Vertical, 2);
    text.set_hexpand(true);

    let name = gtk::Label::new(Some(contact.display_name()));
    name.set_halign(gtk::Align::Start);
    name.set_ellipsize(gtk::pango::EllipsizeMode::End);
    if contact.unread_count > 0 {
        name.add_css_class("heading");
    }
    text.append(&name);

    if contact.role() == Role::Tradesman {
        let role = gtk::Label::new(Some("Tradesman"));
        role.set_halign(gtk::Align::Start);
        role.add_css_class("caption");
        role.add_css_class("accent");
        text.append(&role);
    }

    if let Some(preview) = contact.preview(me, PREVIEW_CHARS) {
        let label = gtk::Label::new(Some(&preview));
        label.set_halign(gtk::Align::Start);
        label.set_ellipsize(gtk::pango::EllipsizeMode::End);
        label.add_css_class("dim-label");
        label.add_css_class("caption");
        text.append(&label);
    }
    row.append(&text);

    if let Some(badge) = contact.unread_badge() {
        let label = gtk::Label::new(Some(&badge));
        label.set_valign(gtk::Align::Center);
        label.add_css_class("badge");
        label.add_css_class("accent");
        row.append(&label);
    }
    row
}
