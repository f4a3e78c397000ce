mod formatting;
mod ui;

use displayctl_core::{
    ConfigStore, DisplayConfig, LockFile, MonitorTransform, NightLightSupervisor, SystemRunner,
    TargetOutcome, commands, percent_to_temp, temp_to_percent,
};
use gtk::gdk;
use gtk::glib;
use gtk4 as gtk;
use libadwaita::{self as adw, Application, prelude::*};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

const SIGINT: i32 = 2;
const SIGTERM: i32 = 15;

fn main() -> glib::ExitCode {
    env_logger::init();
    adw::init().expect("Failed to initialize libadwaita");

    let Some(lock_path) = LockFile::default_path() else {
        log::error!("could not determine the user configuration directory");
        return glib::ExitCode::FAILURE;
    };
    let _lock = match LockFile::acquire(&lock_path) {
        Ok(lock) => lock,
        Err(err) => {
            log::error!("{err}");
            return glib::ExitCode::FAILURE;
        }
    };

    let app = Application::builder()
        .application_id("io.github.displayctl.DisplayControl")
        .build();

    app.connect_activate(|app| {
        let controller = AppController::new(app);
        controller.sync_ui_with_state();
        controller.start_night_light_if_enabled();
    });

    // Route termination signals through the main loop so connect_shutdown
    // cleanup and the lock's Drop still run.
    for signum in [SIGINT, SIGTERM] {
        let app = app.downgrade();
        glib::unix_signal_add_local(signum, move || {
            if let Some(app) = app.upgrade() {
                app.quit();
            }
            glib::ControlFlow::Break
        });
    }

    app.run()
}

struct AppController {
    store: ConfigStore,
    model: Rc<RefCell<AppModel>>,
    widgets: ui::AppWidgets,
    syncing: Cell<bool>,
}

struct AppModel {
    config: DisplayConfig,
    supervisor: NightLightSupervisor<SystemRunner>,
}

impl AppController {
    fn new(app: &Application) -> Rc<Self> {
        let store = ConfigStore::default_paths().expect("no user configuration directory");
        let config = store.load();
        let widgets = ui::AppWidgets::new(app);
        let controller = Rc::new(Self {
            store,
            model: Rc::new(RefCell::new(AppModel {
                config,
                supervisor: NightLightSupervisor::new(SystemRunner::new()),
            })),
            widgets,
            syncing: Cell::new(false),
        });
        controller.setup_handlers(app);
        controller
    }

    fn setup_handlers(self: &Rc<Self>, app: &Application) {
        let controller = Rc::clone(self);
        self.widgets
            .brightness_scale
            .connect_value_changed(move |scale| {
                controller.on_brightness_changed(scale.value() as u32);
            });

        let controller = Rc::clone(self);
        self.widgets.night_switch.connect_active_notify(move |sw| {
            controller.on_night_light_toggled(sw.is_active());
        });

        // Continuous drag only updates intent; the commit fires on release.
        let controller = Rc::clone(self);
        self.widgets.temp_scale.connect_value_changed(move |scale| {
            controller.on_temp_drag(scale.value());
        });

        let controller = Rc::clone(self);
        let release_watch = gtk::EventControllerLegacy::new();
        release_watch.connect_event(move |_, event| {
            if matches!(
                event.event_type(),
                gdk::EventType::ButtonRelease | gdk::EventType::TouchEnd
            ) {
                controller.commit_target();
            }
            glib::Propagation::Proceed
        });
        self.widgets.temp_scale.add_controller(release_watch);

        for (button, transform) in &self.widgets.rotation_buttons {
            let controller = Rc::clone(self);
            let transform = *transform;
            button.connect_clicked(move |_| {
                controller.on_rotate(transform);
            });
        }

        let controller = Rc::clone(self);
        app.connect_shutdown(move |_| {
            controller.model.borrow_mut().supervisor.shutdown();
            commands::kill_color_temp_by_name();
        });
    }

    fn sync_ui_with_state(&self) {
        self.syncing.set(true);
        let config = self.model.borrow().config.clone();

        let brightness = commands::read_brightness_percent().unwrap_or(config.brightness_percent);
        self.widgets.set_brightness(f64::from(brightness));
        self.widgets.set_night_light(config.night_light_on);
        self.widgets.set_temp_sensitive(config.night_light_on);
        self.widgets
            .set_temp_percent(temp_to_percent(config.manual_temp));
        self.widgets.set_temp_label(config.manual_temp);

        let missing = commands::missing_tools();
        if !missing.is_empty() {
            self.widgets.show_missing_tools(&missing);
        }
        self.syncing.set(false);
    }

    fn start_night_light_if_enabled(&self) {
        let mut model = self.model.borrow_mut();
        if model.config.night_light_on {
            let target = model.config.manual_temp;
            model.supervisor.enable(target);
        }
    }

    fn on_brightness_changed(self: &Rc<Self>, percent: u32) {
        if self.syncing.get() {
            return;
        }
        commands::set_brightness(percent);
        self.model.borrow_mut().config.brightness_percent = percent;
        self.persist();
    }

    fn on_night_light_toggled(self: &Rc<Self>, on: bool) {
        if self.syncing.get() {
            return;
        }
        self.widgets.set_temp_sensitive(on);
        {
            let mut model = self.model.borrow_mut();
            model.config.night_light_on = on;
            if on {
                let target = model.config.manual_temp;
                model.supervisor.enable(target);
            } else {
                // Kills the fade too if one is mid-flight.
                model.supervisor.disable();
            }
        }
        self.persist();
    }

    fn on_temp_drag(&self, percent: f64) {
        if self.syncing.get() {
            return;
        }
        let kelvin = percent_to_temp(percent);
        self.model.borrow_mut().config.manual_temp = kelvin;
        self.widgets.set_temp_label(kelvin);
    }

    fn commit_target(self: &Rc<Self>) {
        if self.syncing.get() {
            return;
        }
        let outcome = {
            let mut model = self.model.borrow_mut();
            let target = model.config.manual_temp;
            model.supervisor.set_target(target)
        };
        if let TargetOutcome::FadeStarted { pid } = outcome {
            self.watch_fade(pid);
        }
        self.persist();
    }

    /// Register for the fade process exit on the GLib main context, keyed by
    /// pid so a notification arriving after a disable is ignored.
    fn watch_fade(self: &Rc<Self>, pid: u32) {
        let controller = Rc::clone(self);
        glib::child_watch_add_local(glib::Pid(pid as i32), move |_, _| {
            controller.on_fade_finished(pid);
        });
    }

    fn on_fade_finished(&self, pid: u32) {
        let mut model = self.model.borrow_mut();
        if model.supervisor.complete_fade(pid) {
            log::debug!(
                "fade finished; steady at {:?}K",
                model.supervisor.applied_kelvin()
            );
        }
    }

    fn on_rotate(self: &Rc<Self>, transform: MonitorTransform) {
        commands::set_monitor_transform(transform);
        self.model.borrow_mut().config.monitor_transform = transform;
        self.persist();
    }

    fn persist(&self) {
        let config = self.model.borrow().config.clone();
        if let Err(err) = self.store.save(&config) {
            log::warn!("failed to persist display settings: {err}");
            self.widgets.show_toast("Could not save settings");
        }
    }
}
