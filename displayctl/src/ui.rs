use crate::formatting::{kelvin_label, percent_label};
use displayctl_core::MonitorTransform;
use gtk4 as gtk;
use libadwaita::{self as adw, prelude::*};

pub struct AppWidgets {
    pub toast_overlay: adw::ToastOverlay,
    pub brightness_scale: gtk::Scale,
    pub night_switch: gtk::Switch,
    pub temp_scale: gtk::Scale,
    pub rotation_buttons: Vec<(gtk::Button, MonitorTransform)>,
    temp_value_label: gtk::Label,
    banner: adw::Banner,
}

impl AppWidgets {
    pub fn new(app: &adw::Application) -> Self {
        let window = adw::ApplicationWindow::builder()
            .application(app)
            .title("Display Control")
            .default_width(420)
            .resizable(false)
            .build();

        let toast_overlay = adw::ToastOverlay::new();
        let toolbar_view = adw::ToolbarView::new();
        toast_overlay.set_child(Some(&toolbar_view));

        let header = adw::HeaderBar::new();
        let window_title = adw::WindowTitle::builder().title("Display Control").build();
        header.set_title_widget(Some(&window_title));
        toolbar_view.add_top_bar(&header);

        let banner = adw::Banner::new("");
        banner.set_revealed(false);
        banner.set_button_label(Some("Dismiss"));
        let banner_clone = banner.clone();
        banner.connect_button_clicked(move |_| {
            banner_clone.set_revealed(false);
        });
        toolbar_view.add_top_bar(&banner);

        let content = gtk::Box::builder()
            .orientation(gtk::Orientation::Vertical)
            .spacing(18)
            .margin_top(16)
            .margin_bottom(16)
            .margin_start(16)
            .margin_end(16)
            .build();

        // Brightness
        let brightness_scale = gtk::Scale::with_range(gtk::Orientation::Horizontal, 1.0, 100.0, 1.0);
        brightness_scale.set_draw_value(true);
        brightness_scale.set_format_value_func(|_, value| percent_label(value));
        brightness_scale.set_hexpand(true);

        let brightness_group = adw::PreferencesGroup::builder().title("Brightness").build();
        brightness_group.add(&labeled_scale_row("Dim", &brightness_scale, "Bright"));
        content.append(&brightness_group);

        // Night light
        let night_switch = gtk::Switch::builder()
            .halign(gtk::Align::End)
            .valign(gtk::Align::Center)
            .hexpand(true)
            .build();

        let toggle_row = gtk::Box::builder()
            .orientation(gtk::Orientation::Horizontal)
            .spacing(12)
            .build();
        toggle_row.append(&gtk::Label::new(Some("Enable night light")));
        toggle_row.append(&night_switch);

        let temp_scale = gtk::Scale::with_range(gtk::Orientation::Horizontal, 0.0, 100.0, 1.0);
        temp_scale.set_draw_value(false);
        temp_scale.set_hexpand(true);

        let temp_value_label = gtk::Label::builder()
            .xalign(1.0)
            .css_classes(["dim-label"])
            .build();

        let night_box = gtk::Box::builder()
            .orientation(gtk::Orientation::Vertical)
            .spacing(8)
            .build();
        night_box.append(&toggle_row);
        night_box.append(&labeled_scale_row("Cool", &temp_scale, "Warm"));
        night_box.append(&temp_value_label);

        let night_group = adw::PreferencesGroup::builder().title("Night Light").build();
        night_group.add(&night_box);
        content.append(&night_group);

        // Rotation, laid out as a compass around the center.
        let grid = gtk::Grid::builder()
            .column_spacing(10)
            .row_spacing(10)
            .halign(gtk::Align::Center)
            .build();
        let placements = [
            (MonitorTransform::Normal, 1, 0),
            (MonitorTransform::Left, 0, 1),
            (MonitorTransform::Inverted, 1, 2),
            (MonitorTransform::Right, 2, 1),
        ];
        let mut rotation_buttons = Vec::with_capacity(placements.len());
        for (transform, column, row) in placements {
            let button = gtk::Button::with_label(transform.label());
            grid.attach(&button, column, row, 1, 1);
            rotation_buttons.push((button, transform));
        }

        let rotation_group = adw::PreferencesGroup::builder()
            .title("Screen Rotation")
            .build();
        rotation_group.add(&grid);
        content.append(&rotation_group);

        toolbar_view.set_content(Some(&content));
        window.set_content(Some(&toast_overlay));
        window.present();

        AppWidgets {
            toast_overlay,
            brightness_scale,
            night_switch,
            temp_scale,
            rotation_buttons,
            temp_value_label,
            banner,
        }
    }

    pub fn set_brightness(&self, percent: f64) {
        self.brightness_scale.set_value(percent);
    }

    pub fn set_night_light(&self, on: bool) {
        self.night_switch.set_active(on);
    }

    pub fn set_temp_percent(&self, percent: f64) {
        self.temp_scale.set_value(percent);
    }

    pub fn set_temp_sensitive(&self, sensitive: bool) {
        self.temp_scale.set_sensitive(sensitive);
    }

    pub fn set_temp_label(&self, kelvin: u32) {
        self.temp_value_label.set_label(&kelvin_label(kelvin));
    }

    pub fn show_missing_tools(&self, missing: &[&str]) {
        self.banner
            .set_title(&format!("Missing tools: {}", missing.join(", ")));
        self.banner.set_revealed(true);
    }

    pub fn show_toast(&self, text: &str) {
        let toast = adw::Toast::builder().title(text).timeout(2).build();
        self.toast_overlay.add_toast(toast);
    }
}

fn labeled_scale_row(start: &str, scale: &gtk::Scale, end: &str) -> gtk::Box {
    let row = gtk::Box::builder()
        .orientation(gtk::Orientation::Horizontal)
        .spacing(10)
        .build();
    row.append(&gtk::Label::new(Some(start)));
    row.append(scale);
    row.append(&gtk::Label::new(Some(end)));
    row
}
