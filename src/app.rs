use adw::Application;
use tradehub::config::Settings;
use tradehub::selection::Route;
use tradehub::session::SessionHandle;

/// Opens the messages window when a stored session exists, the login window otherwise.
pub fn build_ui(app: &Application) {
    let settings = Settings::load();
    let session = SessionHandle::new(settings.session());
    let route = std::env::var("TRADEHUB_OPEN")
        .ok()
        .and_then(|path| Route::parse(&path))
        .unwrap_or_default();
    show_for_session(app, session, route);
}

pub fn show_for_session(app: &Application, session: SessionHandle, route: Route) {
    if session.is_signed_in() {
        crate::ui::main_window::show_main_window(app, session, route);
    } else {
        crate::ui::login::show_login_window(app, session);
    }
}

pub fn sign_out(app: &Application, session: &SessionHandle) {
    session.sign_out();
    let mut settings = Settings::load();
    settings.forget_session();
    if let Err(e) = settings.save() {
        log::warn!("could not save settings: {}", e);
    }
    crate::ui::login::show_login_window(app, session.clone());
}
