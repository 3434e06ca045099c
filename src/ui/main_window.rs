use adw::prelude::*;
use adw::Application;
use std::cell::RefCell;
use std::rc::Rc;
use tradehub::api::client::ApiClient;
use tradehub::api::MessagingApi;
use tradehub::cache::QueryKey;
use tradehub::composer::SubmitOutcome;
use tradehub::config::Settings;
use tradehub::directory::fetch_directory;
use tradehub::page::MessagesPage;
use tradehub::selection::Route;
use tradehub::session::SessionHandle;
use tradehub::storage::{self, Storage};
use tradehub::thread::fetch_thread;
use tradehub::Error;

use crate::ui::chat_view::{ChatView, ComposerView};
use crate::ui::sidebar::Sidebar;

struct Screen {
    app: Application,
    window: adw::ApplicationWindow,
    session: SessionHandle,
    page: RefCell<MessagesPage>,
    api: ApiClient,
    storage: RefCell<Option<Storage>>,
    overlay: adw::ToastOverlay,
    sidebar: Sidebar,
    chat: ChatView,
    route_label: gtk4::Label,
}

pub fn show_main_window(app: &Application, session: SessionHandle, route: Route) {
    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("TradeHub Messages")
        .default_width(960)
        .default_height(640)
        .build();

    let overlay = adw::ToastOverlay::new();

    let split = adw::Flap::builder()
        .reveal_flap(true)
        .locked(true)
        .modal(false)
        .build();

    let sidebar = Sidebar::new();
    split.set_flap(Some(&sidebar.widget()));

    let chat = ChatView::new();
    split.set_content(Some(&chat.widget()));

    overlay.set_child(Some(&split));

    let container = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    let title_box = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
    let title = gtk4::Label::new(Some("TradeHub"));
    title.add_css_class("title");
    let route_label = gtk4::Label::new(None);
    route_label.add_css_class("subtitle");
    title_box.append(&title);
    title_box.append(&route_label);
    header.set_title_widget(Some(&title_box));

    let refresh_btn = gtk4::Button::from_icon_name("view-refresh-symbolic");
    refresh_btn.set_tooltip_text(Some("Refresh"));
    header.pack_start(&refresh_btn);

    let sign_out_btn = gtk4::Button::with_label("Sign Out");
    header.pack_end(&sign_out_btn);
    container.append(&header);
    container.append(&overlay);
    window.set_content(Some(&container));
    window.present();

    let storage = match storage::db_path().map(|p| Storage::open(&p)) {
        Some(Ok(s)) => Some(s),
        Some(Err(e)) => {
            log::warn!("local cache unavailable: {}", e);
            None
        }
        None => None,
    };

    let mut page = MessagesPage::new(session.clone(), route);
    if let Some(cached) = storage.as_ref().and_then(|s| s.get_contacts(Some(200)).ok()) {
        page.set_snapshot(cached);
    }

    let screen = Rc::new(Screen {
        app: app.clone(),
        window: window.clone(),
        session,
        page: RefCell::new(page),
        api: ApiClient::new(),
        storage: RefCell::new(storage),
        overlay,
        sidebar,
        chat,
        route_label,
    });

    {
        let handle = screen.clone();
        screen.sidebar.connect_selected(move |id| {
            let handle = handle.clone();
            glib::idle_add_local_once(move || handle.select(id));
        });
    }
    {
        let handle = screen.clone();
        screen.chat.connect_draft_changed(move |text| {
            if let Some(composer) = handle.page.borrow_mut().composer_mut() {
                composer.set_draft(text);
            }
            handle.render_composer();
        });
    }
    {
        let handle = screen.clone();
        screen.chat.connect_send(move || handle.send());
    }
    {
        let handle = screen.clone();
        refresh_btn.connect_clicked(move |_| {
            handle.page.borrow_mut().reload();
            handle.refresh();
        });
    }
    {
        let handle = screen.clone();
        sign_out_btn.connect_clicked(move |_| handle.sign_out());
    }

    let poll_secs = Settings::load().poll_interval_secs;
    if poll_secs > 0 {
        let weak = Rc::downgrade(&screen);
        glib::timeout_add_seconds_local(poll_secs as u32, move || {
            let Some(screen) = weak.upgrade() else {
                return glib::ControlFlow::Break;
            };
            if !screen.session.is_signed_in() {
                return glib::ControlFlow::Break;
            }
            screen.page.borrow_mut().poll();
            screen.refresh();
            glib::ControlFlow::Continue
        });
    }

    screen.render();
    screen.refresh();
}

impl Screen {
    /// Fetches whatever the cache marks as missing or stale.
    fn refresh(self: &Rc<Self>) {
        self.load_directory();
        self.load_thread();
        self.render();
    }

    fn load_directory(self: &Rc<Self>) {
        let Some(ticket) = self.page.borrow_mut().start_directory_fetch() else {
            return;
        };
        let session = self.session.current();
        let api = self.api.clone();
        let rx = crate::utils::run_async_to_main(async move { fetch_directory(&api, session.as_ref()).await });
        let screen = self.clone();
        rx.attach(None, move |res| {
            if let Err(e) = &res {
                if e.is_unauthenticated() {
                    screen.session_expired();
                    return glib::ControlFlow::Break;
                }
            }
            if let (Ok(list), Some(storage)) = (&res, screen.storage.borrow_mut().as_mut()) {
                if let Err(e) = storage.replace_contacts(list) {
                    log::warn!("could not store directory snapshot: {}", e);
                }
            }
            let nav = screen.page.borrow_mut().complete_directory_fetch(ticket, res);
            if let Some(route) = nav {
                log::info!("auto-selected {}", route);
            }
            screen.load_thread();
            screen.render();
            glib::ControlFlow::Continue
        });
    }

    fn load_thread(self: &Rc<Self>) {
        let Some((ticket, contact_id)) = self.page.borrow_mut().start_thread_fetch() else {
            return;
        };
        let session = self.session.current();
        let api = self.api.clone();
        let rx = crate::utils::run_async_to_main(async move {
            fetch_thread(&api, session.as_ref(), contact_id).await
        });
        let screen = self.clone();
        rx.attach(None, move |res| {
            screen.page.borrow_mut().complete_thread_fetch(ticket, res);
            // A read thread may have made the directory stale.
            screen.load_directory();
            screen.render();
            glib::ControlFlow::Continue
        });
    }

    fn select(self: &Rc<Self>, contact_id: i64) {
        self.page.borrow_mut().navigate(Route::thread(contact_id), true);
        self.sync_entry();
        self.refresh();
        self.chat.focus_entry();
    }

    fn send(self: &Rc<Self>) {
        let prepared = self.page.borrow_mut().begin_send();
        let body = match prepared {
            None => return,
            Some(Ok(body)) => body,
            Some(Err(Error::Validation(e))) => {
                self.chat.show_field_error(&e.to_string());
                return;
            }
            Some(Err(Error::SubmitInFlight)) => return,
            Some(Err(e)) => {
                self.toast(&e.user_message());
                return;
            }
        };
        let Some(session) = self.session.current() else {
            self.page.borrow_mut().finish_send(body.receiver_id, Err(Error::Unauthenticated));
            self.toast(&Error::Unauthenticated.user_message());
            return;
        };
        self.render_composer();

        let receiver = body.receiver_id;
        let api = self.api.clone();
        let rx = crate::utils::run_async_to_main(async move { api.send_message(&session, &body).await });
        let screen = self.clone();
        rx.attach(None, move |res| {
            let outcome = screen.page.borrow_mut().finish_send(receiver, res);
            match outcome {
                Some(SubmitOutcome::Sent { .. }) => screen.sync_entry(),
                Some(SubmitOutcome::Failed { notification }) => screen.toast(&notification),
                Some(SubmitOutcome::Blocked(e)) => screen.toast(&e.user_message()),
                None => {}
            }
            screen.refresh();
            glib::ControlFlow::Continue
        });
    }

    fn render(&self) {
        let page = self.page.borrow();
        let me = self.session.current().map(|s| s.user_id()).unwrap_or_default();
        let directory = page.directory();
        let active = page.active_contact();
        let route_id = page.route().contact_id().map(str::to_string);
        let thread = page.active_thread();
        let (loading, error) = match &active {
            Some(c) => {
                let key = QueryKey::Thread(c.id);
                (page.cache().is_loading(key), page.cache().error(key).map(str::to_string))
            }
            None => (false, None),
        };
        self.route_label.set_label(&page.route().path());
        drop(page);

        self.sidebar.set_state(&directory, active.as_ref().map(|c| c.id), me);
        self.chat.set_contact(route_id.as_deref(), active.as_ref());
        self.chat.set_thread(thread.as_deref(), loading, error.as_deref(), me);
        self.render_composer();
    }

    fn sync_entry(&self) {
        let draft = self.page.borrow().composer().map(|c| c.draft().to_string()).unwrap_or_default();
        self.chat.set_entry(&draft);
    }

    fn render_composer(&self) {
        let view = self.page.borrow().composer().map(|c| ComposerView {
            draft_len: c.draft().chars().count(),
            error: c.field_error(),
            can_send: c.can_submit(),
            sending: c.is_in_flight(),
        });
        if let Some(view) = view {
            self.chat.set_composer(&view);
        }
    }

    fn toast(&self, text: &str) {
        self.overlay.add_toast(adw::Toast::new(text));
    }

    fn session_expired(&self) {
        log::warn!("session rejected by server");
        self.sign_out();
    }

    fn sign_out(&self) {
        crate::app::sign_out(&self.app, &self.session);
        self.window.close();
    }
}
