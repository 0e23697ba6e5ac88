use eframe::egui;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use dw5xle_core::{
    EditorSession, Field, BACKUP_EXTENSION, MOD_EXTENSION, NUM_FIELDS, NUM_SLOTS_TOTAL,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GuiConfig {
    image_path: String,
    mod_dir: String,
}

impl Default for GuiConfig {
    fn default() -> Self {
        Self {
            image_path: String::new(),
            mod_dir: String::new(),
        }
    }
}

fn config_path() -> Option<PathBuf> {
    let mut base = dirs::config_dir().or_else(|| dirs::data_dir())?;
    base.push("DW5XLE");
    base.push("gui_config.json");
    Some(base)
}

fn load_config() -> GuiConfig {
    if let Some(path) = config_path() {
        if let Ok(data) = fs::read_to_string(&path) {
            if let Ok(cfg) = serde_json::from_str::<GuiConfig>(&data) {
                return cfg;
            }
        }
    }
    GuiConfig::default()
}

fn save_config(cfg: &GuiConfig) {
    if let Some(path) = config_path() {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Ok(data) = serde_json::to_string_pretty(cfg) {
            let _ = fs::write(path, data);
        }
    }
}

struct EditorApp {
    image_path: String,
    mod_dir: String,

    session: Option<EditorSession>,
    slot: usize,
    field_values: [u32; NUM_FIELDS],

    log: String,
}

impl Default for EditorApp {
    fn default() -> Self {
        let cfg = load_config();

        Self {
            image_path: cfg.image_path,
            mod_dir: cfg.mod_dir,
            session: None,
            slot: 0,
            field_values: [0; NUM_FIELDS],
            log: String::new(),
        }
    }
}

impl EditorApp {
    fn log_line(&mut self, message: impl Into<String>) {
        if !self.log.is_empty() {
            self.log.push('\n');
        }
        self.log.push_str(&message.into());
    }

    fn persist_config(&self) {
        save_config(&GuiConfig {
            image_path: self.image_path.clone(),
            mod_dir: self.mod_dir.clone(),
        });
    }

    fn load_slot_values(&mut self) {
        if let Some(session) = self.session.as_ref() {
            match session.record(self.slot) {
                Ok(record) => {
                    for field in Field::ALL {
                        self.field_values[field as usize] = record.get(field);
                    }
                }
                Err(e) => {
                    let msg = format!("Failed to decode slot {:#x}: {}", self.slot, e);
                    self.log_line(msg);
                }
            }
        }
    }

    fn open_image(&mut self) {
        let path = PathBuf::from(self.image_path.trim());
        match EditorSession::open(&path) {
            Ok(session) => {
                self.log_line(format!(
                    "Loaded unit table at {:#x} from {}",
                    session.table_offset(),
                    path.display()
                ));
                if session.backup_created() {
                    self.log_line(format!(
                        "Backup written: {}",
                        session.backup_path().display()
                    ));
                }
                self.session = Some(session);
                self.slot = 0;
                self.load_slot_values();
                self.persist_config();
            }
            Err(e) => {
                self.log_line(format!("Failed to open {}: {}", path.display(), e));
            }
        }
    }

    fn submit_slot(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let mut record = match session.record(self.slot) {
            Ok(r) => r,
            Err(e) => {
                let msg = format!("Failed to decode slot {:#x}: {}", self.slot, e);
                self.log_line(msg);
                return;
            }
        };

        // Hidden fields keep whatever the buffer already holds; only the
        // visible rows come from the form.
        for field in Field::ALL {
            if !field.hidden() {
                record.set(field, self.field_values[field as usize]);
            }
        }

        let result = session.submit(self.slot, &record);
        match result {
            Ok(()) => {
                let msg = format!("Submitted slot {:#x}", self.slot);
                self.log_line(msg);
            }
            Err(e) => {
                let msg = format!("Submit failed: {}", e);
                self.log_line(msg);
            }
        }
    }
}

impl eframe::App for EditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("DW5XL Unit Data Editor");
            ui.separator();

            ui.horizontal(|ui| {
                ui.label("Disc image:");
                ui.text_edit_singleline(&mut self.image_path);
                if ui.button("Browse...").clicked() {
                    let mut dialog = rfd::FileDialog::new()
                        .add_filter("Disc image", &["iso", "bin", "img"])
                        .add_filter("All files", &["*"]);
                    if !self.image_path.trim().is_empty() {
                        if let Some(parent) = Path::new(self.image_path.trim()).parent() {
                            dialog = dialog.set_directory(parent);
                        }
                    }
                    if let Some(path) = dialog.pick_file() {
                        self.image_path = path.display().to_string();
                    }
                }
                if ui.button("Open").clicked() {
                    self.open_image();
                }
            });

            ui.separator();

            if self.session.is_some() {
                let previous_slot = self.slot;
                ui.horizontal(|ui| {
                    ui.label("Slot:");
                    egui::ComboBox::from_id_source("slot_select")
                        .selected_text(format!("{:#x}", self.slot))
                        .show_ui(ui, |ui| {
                            for idx in 0..NUM_SLOTS_TOTAL {
                                ui.selectable_value(&mut self.slot, idx, format!("{:#x}", idx));
                            }
                        });
                });
                if self.slot != previous_slot {
                    self.load_slot_values();
                }

                ui.separator();

                egui::Grid::new("field_grid")
                    .num_columns(4)
                    .spacing([16.0, 4.0])
                    .show(ui, |ui| {
                        let mut column = 0;
                        for field in Field::ALL {
                            if field.hidden() {
                                continue;
                            }
                            ui.label(field.label());
                            ui.add(
                                egui::DragValue::new(&mut self.field_values[field as usize])
                                    .clamp_range(0..=field.max_value()),
                            );
                            column += 1;
                            if column % 2 == 0 {
                                ui.end_row();
                            }
                        }
                    });

                ui.separator();

                ui.horizontal(|ui| {
                    if ui.button("Submit slot").clicked() {
                        self.submit_slot();
                    }

                    if ui.button("Save mod...").clicked() {
                        let mut dialog = rfd::FileDialog::new()
                            .add_filter("DW5XL mod", &[MOD_EXTENSION])
                            .set_file_name(format!("units.{MOD_EXTENSION}"));
                        if !self.mod_dir.trim().is_empty() {
                            dialog = dialog.set_directory(self.mod_dir.trim());
                        }
                        if let Some(path) = dialog.save_file() {
                            if let Some(parent) = path.parent() {
                                self.mod_dir = parent.display().to_string();
                            }
                            let result = self
                                .session
                                .as_ref()
                                .map(|s| s.save_mod(&path))
                                .unwrap_or(Ok(()));
                            match result {
                                Ok(()) => self.log_line(format!("Saved {}", path.display())),
                                Err(e) => self.log_line(format!("Save failed: {}", e)),
                            }
                            self.persist_config();
                        }
                    }

                    if ui.button("Load mod...").clicked() {
                        let mut dialog = rfd::FileDialog::new().add_filter(
                            "DW5XL mod / backup",
                            &[MOD_EXTENSION, BACKUP_EXTENSION],
                        );
                        if !self.mod_dir.trim().is_empty() {
                            dialog = dialog.set_directory(self.mod_dir.trim());
                        }
                        if let Some(path) = dialog.pick_file() {
                            let result = self
                                .session
                                .as_mut()
                                .map(|s| s.load_mod(&path))
                                .unwrap_or(Ok(()));
                            match result {
                                Ok(()) => {
                                    self.log_line(format!("Loaded {}", path.display()));
                                    self.load_slot_values();
                                }
                                Err(e) => self.log_line(format!("Load failed: {}", e)),
                            }
                        }
                    }

                    if ui.button("Write to image").clicked() {
                        let result = self
                            .session
                            .as_ref()
                            .map(|s| s.write_to_image())
                            .unwrap_or(Ok(()));
                        match result {
                            Ok(()) => self.log_line("Wrote unit table into the disc image"),
                            Err(e) => self.log_line(format!("Write failed: {}", e)),
                        }
                    }

                    if ui.button("Restore backup").clicked() {
                        let result = self
                            .session
                            .as_mut()
                            .map(|s| s.restore_backup())
                            .unwrap_or(Ok(()));
                        match result {
                            Ok(()) => {
                                self.log_line("Restored original unit table");
                                self.load_slot_values();
                            }
                            Err(e) => self.log_line(format!("Restore failed: {}", e)),
                        }
                    }
                });
            } else {
                ui.label("Open a disc image to start editing.");
            }

            ui.separator();
            ui.label("Log:");
            egui::ScrollArea::vertical()
                .id_source("log_scroll")
                .show(ui, |ui| {
                    ui.monospace(&self.log);
                });
        });
    }
}

fn main() -> eframe::Result<()> {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([760.0, 640.0]),
        ..Default::default()
    };
    eframe::run_native(
        "DW5XL Unit Data Editor",
        native_options,
        Box::new(|cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Box::new(EditorApp::default())
        }),
    )
}
