#![windows_subsystem = "windows"]

use eframe::egui;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use yuanshen_launcher::*;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([760.0, 640.0])
            .with_title("方块解迷"),
        ..Default::default()
    };
    eframe::run_native(
        "yuanshen-gui",
        options,
        Box::new(|cc| {
            setup_cjk_font(&cc.egui_ctx);
            Ok(Box::new(LauncherApp::default()))
        }),
    )
}

fn setup_cjk_font(ctx: &egui::Context) {
    let mut fonts = egui::FontDefinitions::default();
    let font_paths = [
        "C:\\Windows\\Fonts\\msyh.ttc",
        "C:\\Windows\\Fonts\\YuGothR.ttc",
        "C:\\Windows\\Fonts\\msgothic.ttc",
        "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
        "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    ];
    for path in &font_paths {
        if let Ok(data) = std::fs::read(path) {
            fonts.font_data.insert("cjk".to_owned(), egui::FontData::from_owned(data));
            fonts.families
                .entry(egui::FontFamily::Proportional)
                .or_default()
                .insert(0, "cjk".to_owned());
            fonts.families
                .entry(egui::FontFamily::Monospace)
                .or_default()
                .push("cjk".to_owned());
            break;
        }
    }
    ctx.set_fonts(fonts);
}

// ─── データ構造 ─────────────────────────────────────

struct RunResultDisplay {
    stdout: String,
    summary: String,
    status: String,
    elapsed_ms: u128,
    save_path: Option<String>,
}

struct RunState {
    running: bool,
    result: Option<RunResultDisplay>,
    /// ワーカーから届いた未表示の警告
    warnings: Vec<String>,
}

struct LauncherApp {
    form: PuzzleForm,
    solver_input: String,
    timeout_input: String,
    save_log: bool,
    run_state: Arc<Mutex<RunState>>,
    cancel: Arc<AtomicBool>,
    /// 表示待ちの警告（先頭から1件ずつ表示）
    warnings: Vec<String>,
}

impl Default for LauncherApp {
    fn default() -> Self {
        Self {
            form: PuzzleForm::default(),
            solver_input: std::env::var("YUANSHEN_SOLVER").unwrap_or_else(|_| DEFAULT_SOLVER.to_string()),
            timeout_input: String::new(),
            save_log: true,
            run_state: Arc::new(Mutex::new(RunState {
                running: false, result: None, warnings: Vec::new(),
            })),
            cancel: Arc::new(AtomicBool::new(false)),
            warnings: Vec::new(),
        }
    }
}

impl eframe::App for LauncherApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let running = {
            let mut s = self.run_state.lock().unwrap();
            self.warnings.append(&mut s.warnings);
            s.running
        };
        if running {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("方块解迷");
                ui.separator();
                ui.label("ソルバー:");
                ui.add(egui::TextEdit::singleline(&mut self.solver_input).desired_width(200.0));
                ui.label("制限時間(秒):");
                ui.add(egui::TextEdit::singleline(&mut self.timeout_input).desired_width(40.0));
                ui.checkbox(&mut self.save_log, "ログ保存");
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(!running, |ui| self.ui_form(ui));
            ui.separator();
            ui.horizontal(|ui| {
                if !running {
                    if ui.button("求解").clicked() {
                        self.start_run();
                    }
                } else {
                    if ui.button("停止").clicked() {
                        self.cancel.store(true, Ordering::Relaxed);
                    }
                    ui.spinner();
                }
            });
            ui.separator();
            self.ui_output(ui);
        });

        self.ui_warning(ctx);
    }
}

impl LauncherApp {
    // ─── 入力フォーム ──────────────────────────────
    fn ui_form(&mut self, ui: &mut egui::Ui) {
        let number = self.form.number;
        ui.horizontal(|ui| {
            ui.label("ブロック数:");
            ui.add(egui::DragValue::new(&mut self.form.number).range(1..=MAX_UNITS));
            ui.label("状態数:");
            ui.add(egui::DragValue::new(&mut self.form.max_state).range(1..=99));
        });

        ui.label("連動ブロック");
        egui::Grid::new("units_grid").striped(true).show(ui, |ui| {
            ui.label("");
            for j in 0..MAX_UNITS {
                ui.label(format!("{}", j + 1));
            }
            ui.end_row();
            for (i, unit) in self.form.units.iter_mut().enumerate() {
                ui.label(format!("ブロック{}", i + 1));
                for (j, checked) in unit.targets.iter_mut().enumerate() {
                    ui.add_enabled(i < number && j < number, egui::Checkbox::without_text(checked));
                }
                ui.end_row();
            }
        });

        ui.add_space(4.0);
        egui::Grid::new("states_grid").show(ui, |ui| {
            ui.label("開始状態");
            ui.add(egui::TextEdit::singleline(&mut self.form.begin).hint_text("1,2,3"));
            ui.end_row();
            for (i, end) in self.form.ends.iter_mut().enumerate() {
                ui.label(format!("終了状態{}", i + 1));
                ui.add(egui::TextEdit::singleline(end));
                ui.end_row();
            }
        });
    }

    // ─── 出力 ──────────────────────────────────
    fn ui_output(&mut self, ui: &mut egui::Ui) {
        let state = self.run_state.lock().unwrap();
        let Some(ref result) = state.result else {
            return;
        };
        ui.horizontal(|ui| {
            ui.label(format!("{} | {}ms", result.status, result.elapsed_ms));
            if let Some(ref path) = result.save_path {
                ui.colored_label(egui::Color32::GREEN, format!("保存: {}", path));
            }
        });
        ui.columns(2, |cols| {
            egui::ScrollArea::vertical().id_salt("stdout").show(&mut cols[0], |ui| {
                ui.add(
                    egui::TextEdit::multiline(&mut result.stdout.as_str())
                        .font(egui::TextStyle::Monospace)
                        .desired_width(f32::INFINITY),
                );
            });
            egui::ScrollArea::vertical().id_salt("summary").show(&mut cols[1], |ui| {
                ui.label(&result.summary);
            });
        });
    }

    fn ui_warning(&mut self, ctx: &egui::Context) {
        let Some(message) = self.warnings.first().cloned() else {
            return;
        };
        egui::Window::new("警告")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message);
                if ui.button("OK").clicked() {
                    self.warnings.remove(0);
                }
            });
    }

    // ─── 実行 ──────────────────────────────────
    fn start_run(&mut self) {
        if let Err(e) = self.form.validate() {
            self.warnings.push(e.to_string());
            return;
        }
        let timeout = match self.timeout_input.trim() {
            "" => None,
            t => match t.parse::<u64>() {
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(_) => {
                    self.warnings.push(format!("'{}' は制限時間(秒)として不正です", t));
                    return;
                }
            },
        };

        let form = self.form.clone();
        let program = self.solver_input.trim().to_string();
        let solver = SolverCommand::new(PathBuf::from(&program)).with_timeout(timeout);
        let save_log = self.save_log;

        self.cancel.store(false, Ordering::Relaxed);
        {
            let mut s = self.run_state.lock().unwrap();
            s.running = true;
            s.result = None;
        }
        let state = self.run_state.clone();
        let cancel = self.cancel.clone();

        thread::spawn(move || {
            // パニック時も running = false を保証するガード
            struct RunGuard(Arc<Mutex<RunState>>);
            impl Drop for RunGuard {
                fn drop(&mut self) {
                    if let Ok(mut s) = self.0.lock() {
                        s.running = false;
                    }
                }
            }
            let _guard = RunGuard(state.clone());

            let mut warnings = Vec::new();
            let launched = run_form_cancellable(&form, &solver, &cancel, |w| warnings.push(w.to_string()));
            state.lock().unwrap().warnings.append(&mut warnings);
            let result = match launched {
                Ok(result) => result,
                Err(e) => {
                    state.lock().unwrap().warnings.push(e.to_string());
                    return;
                }
            };
            let Some(output) = result.output else {
                return;
            };
            let args = result.args;
            let save_path = if save_log {
                match save_run_log(&output_dir(), &program, &form, &args, &output) {
                    Ok(path) => Some(path.display().to_string()),
                    Err(e) => {
                        log::warn!("実行ログを保存できません: {}", e);
                        None
                    }
                }
            } else {
                None
            };
            let summary = SolverReport::parse(&output.stdout).to_string();
            let mut s = state.lock().unwrap();
            s.result = Some(RunResultDisplay {
                stdout: output.stdout,
                summary,
                status: output.status.to_string(),
                elapsed_ms: output.elapsed.as_millis(),
                save_path,
            });
        });
    }
}
