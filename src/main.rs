mod app;
mod ui;
mod utils;

use adw::prelude::*;
use adw::Application;

fn main() {
    crate::utils::init_logging();
    let app = Application::builder()
        .application_id("com.tradehub.MessagesGtk")
        .build();
    app.connect_activate(|app| {
        crate::app::build_ui(app);
    });
    app.run();
}
