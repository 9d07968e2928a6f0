// src/common/log.rs

use crate::common::env;
use chrono::Local;
use lazy_static::lazy_static;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

const FLUSH_THRESHOLD: usize = 10;
const FLUSH_INTERVAL: Duration = Duration::from_secs(10);

lazy_static! {
    static ref LAST_LOG_TIME: Mutex<Option<Instant>> = Mutex::new(None);
    static ref LOG_SENDER: Mutex<Option<mpsc::Sender<String>>> = Mutex::new(None);
    static ref LOG_PATH: Mutex<Option<PathBuf>> = Mutex::new(None);
    static ref CONFIGURED_LOG_LEVEL: LogLevel = LogLevel::parse(&env::CONFIG.log_level);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl LogLevel {
    // Unrecognized values fall back to Info.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "error" => LogLevel::Error,
            "warn" | "warning" => LogLevel::Warn,
            "debug" | "trace" => LogLevel::Debug,
            _ => LogLevel::Info,
        }
    }

    fn color(self) -> Color {
        match self {
            LogLevel::Debug => Color::Magenta,
            LogLevel::Info => Color::White,
            LogLevel::Warn => Color::Yellow,
            LogLevel::Error => Color::Red,
        }
    }
}

// Initializes both console and file logging systems.
pub fn init() {
    if let Ok(mut last) = LAST_LOG_TIME.lock() {
        *last = Some(Instant::now());
    }
    start_file_logger();
}

pub fn enabled(level: LogLevel) -> bool {
    level >= *CONFIGURED_LOG_LEVEL
}

// Logs a colored line to the console and a plain copy to the log file.
pub fn log(level: LogLevel, content: &str) {
    if !enabled(level) {
        return;
    }

    let elapsed = {
        let now = Instant::now();
        match LAST_LOG_TIME.lock() {
            Ok(mut last) => {
                let diff = last.map(|prev| now.duration_since(prev)).unwrap_or_default();
                *last = Some(now);
                format_duration(diff)
            }
            Err(_) => "0us".to_string(),
        }
    };

    let time_str = Local::now().format("%H:%M:%S");
    let diff_color = match level {
        LogLevel::Debug => Color::Blue,
        _ => Color::Yellow,
    };

    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(level.color())));
    let _ = write!(&mut stdout, "{} ", time_str);
    let _ = stdout.reset();
    let _ = write!(&mut stdout, "{} ", content);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(diff_color)));
    let _ = writeln!(&mut stdout, "+{}", elapsed);
    let _ = stdout.reset();

    log_to_file(format!("{} {} +{}", time_str, content, elapsed));
}

pub fn debug(content: &str) {
    log(LogLevel::Debug, content);
}

pub fn info(content: &str) {
    log(LogLevel::Info, content);
}

pub fn warn(content: &str) {
    log(LogLevel::Warn, content);
}

pub fn error(content: &str) {
    log(LogLevel::Error, content);
}

// Path of the current log file, once the file logger has created it.
pub fn get_log_path() -> Option<PathBuf> {
    LOG_PATH.lock().ok().and_then(|p| p.clone())
}

fn log_to_file(message: String) {
    if let Ok(guard) = LOG_SENDER.lock() {
        if let Some(sender) = guard.as_ref() {
            let _ = sender.send(message);
        }
    }
}

fn start_file_logger() {
    let log_path = match create_log_path() {
        Ok(path) => path,
        Err(_) => return,
    };
    if let Ok(mut slot) = LOG_PATH.lock() {
        *slot = Some(log_path.clone());
    }

    let (tx, rx) = mpsc::channel::<String>();
    if let Ok(mut sender) = LOG_SENDER.lock() {
        *sender = Some(tx);
    }

    thread::spawn(move || {
        let mut buffer: Vec<String> = Vec::with_capacity(FLUSH_THRESHOLD);
        loop {
            match rx.recv_timeout(FLUSH_INTERVAL) {
                Ok(entry) => {
                    buffer.push(entry);
                    if buffer.len() >= FLUSH_THRESHOLD {
                        flush_buffer_to_file(&log_path, &mut buffer);
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    flush_buffer_to_file(&log_path, &mut buffer);
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    flush_buffer_to_file(&log_path, &mut buffer);
                    break;
                }
            }
        }
    });
}

fn flush_buffer_to_file(path: &Path, buffer: &mut Vec<String>) {
    if buffer.is_empty() {
        return;
    }
    if let Ok(mut file) = fs::OpenOptions::new().create(true).append(true).open(path) {
        let _ = file.write_all(buffer.join("\n").as_bytes());
        let _ = file.write_all(b"\n");
    }
    buffer.clear();
}

// ~/.dockdash/logs/<date>/<time>.log
fn create_log_path() -> io::Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Home directory not found"))?;
    let now = Local::now();
    let dir = home_dir
        .join(".dockdash/logs")
        .join(now.format("%Y-%m-%d").to_string());

    fs::create_dir_all(&dir)?;
    Ok(dir.join(now.format("%H-%M-%S.log").to_string()))
}

fn format_duration(duration: Duration) -> String {
    let micros = duration.as_micros();
    if micros < 1_000 {
        format!("{}us", micros)
    } else if micros < 1_000_000 {
        format!("{}ms", micros / 1_000)
    } else if micros < 60_000_000 {
        format!("{}s", micros / 1_000_000)
    } else if micros < 3_600_000_000 {
        format!("{:.2}m", micros as f64 / 60_000_000.0)
    } else if micros < 86_400_000_000 {
        format!("{:.2}h", micros as f64 / 3_600_000_000.0)
    } else {
        format!("{:.2}d", micros as f64 / 86_400_000_000.0)
    }
}
