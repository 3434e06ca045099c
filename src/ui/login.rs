use adw::prelude::*;
use adw::Application;
use gtk4 as gtk;
use std::time::Duration;
use tradehub::api::client::ApiClient;
use tradehub::config::{normalize_url, Settings};
use tradehub::selection::Route;
use tradehub::session::{Session, SessionHandle};

pub fn show_login_window(app: &Application, session: SessionHandle) {
    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("TradeHub Sign In")
        .default_width(420)
        .default_height(300)
        .resizable(false)
        .build();

    let toast_overlay = adw::ToastOverlay::new();

    let root = gtk::Box::new(gtk::Orientation::Vertical, 12);
    root.set_margin_top(24);
    root.set_margin_bottom(24);
    root.set_margin_start(24);
    root.set_margin_end(24);

    let title = gtk::Label::new(Some("Sign in to TradeHub"));
    title.add_css_class("title-2");
    title.set_halign(gtk::Align::Start);
    root.append(&title);

    let settings = Settings::load();

    let server_entry = gtk::Entry::new();
    server_entry.set_placeholder_text(Some("Server URL (e.g. https://tradehub.example.com)"));
    server_entry.set_text(&settings.base_url);
    server_entry.set_hexpand(true);

    let email_entry = gtk::Entry::new();
    email_entry.set_placeholder_text(Some("Email"));
    email_entry.set_input_purpose(gtk::InputPurpose::Email);
    email_entry.set_hexpand(true);

    let pass_entry = gtk::PasswordEntry::new();
    pass_entry.set_placeholder_text(Some("Password"));
    pass_entry.set_hexpand(true);

    let form = gtk::Box::new(gtk::Orientation::Vertical, 8);
    form.append(&server_entry);
    form.append(&email_entry);
    form.append(&pass_entry);
    root.append(&form);

    let status = gtk::Label::new(None);
    status.add_css_class("dim-label");
    status.set_halign(gtk::Align::Start);
    root.append(&status);

    let login_btn = gtk::Button::with_label("Sign In");
    login_btn.add_css_class("suggested-action");
    login_btn.set_halign(gtk::Align::End);
    root.append(&login_btn);

    toast_overlay.set_child(Some(&root));
    let container = gtk::Box::new(gtk::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    let header_title = gtk::Label::new(Some("TradeHub"));
    header.set_title_widget(Some(&header_title));
    container.append(&header);
    container.append(&toast_overlay);
    window.set_content(Some(&container));

    let on_connect = {
        let app = app.clone();
        let window = window.clone();
        let overlay = toast_overlay.clone();
        let server_entry = server_entry.clone();
        let email_entry = email_entry.clone();
        let pass_entry = pass_entry.clone();
        let login_btn = login_btn.clone();
        move || {
            let base_url = match normalize_url(&server_entry.text()) {
                Ok(url) => url,
                Err(_) => {
                    overlay.add_toast(adw::Toast::new("Please enter a valid server URL."));
                    return;
                }
            };
            let email = email_entry.text().to_string();
            let password = pass_entry.text().to_string();
            if email.trim().is_empty() || password.is_empty() {
                overlay.add_toast(adw::Toast::new("Please enter your email and password."));
                return;
            }

            status.set_label("Signing in…");
            login_btn.set_sensitive(false);

            let rx: glib::Receiver<tradehub::Result<Session>> = crate::utils::run_async_to_main(async move {
                let client = ApiClient::with_timeout(Duration::from_secs(10))?;
                client.login(&base_url, &email, &password).await
            });

            let status_label = status.clone();
            let app2 = app.clone();
            let window2 = window.clone();
            let overlay2 = overlay.clone();
            let session2 = session.clone();
            let login_btn2 = login_btn.clone();
            rx.attach(None, move |res| {
                login_btn2.set_sensitive(true);
                match res {
                    Ok(signed_in) => {
                        status_label.set_label("Signed in");
                        let mut st = Settings::load();
                        st.remember(&signed_in);
                        if let Err(e) = st.save() {
                            overlay2.add_toast(adw::Toast::new(&format!("Failed to save settings: {}", e)));
                        }
                        session2.sign_in(signed_in);
                        crate::app::show_for_session(&app2, session2.clone(), Route::Messages);
                        window2.close();
                    }
                    Err(err) => {
                        log::warn!("sign in failed: {}", err);
                        status_label.set_label("Sign in failed");
                        overlay2.add_toast(adw::Toast::new(&err.user_message()));
                    }
                }
                glib::ControlFlow::Continue
            });
        }
    };

    use std::rc::Rc;
    let on_connect: Rc<dyn Fn()> = Rc::new(on_connect);
    {
        let on_connect = on_connect.clone();
        login_btn.connect_clicked(move |_| (on_connect)());
    }
    {
        let on_connect = on_connect.clone();
        email_entry.connect_activate(move |_| (on_connect)());
    }
    {
        let on_connect = on_connect.clone();
        pass_entry.connect_activate(move |_| (on_connect)());
    }

    window.present();
}
