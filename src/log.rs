use chrono::Local;
use colored::*;
use std::sync::atomic::{AtomicBool, Ordering};

static DEBUG: AtomicBool = AtomicBool::new(false);

pub fn set_debug(enabled: bool) {
  DEBUG.store(enabled, Ordering::Relaxed);
}

pub fn debug_enabled() -> bool {
  DEBUG.load(Ordering::Relaxed)
}

fn stamp() -> String {
  Local::now().format("%H:%M:%S").to_string()
}

pub fn success(msg: impl std::fmt::Display) {
  println!("{} {}", stamp().dimmed(), format!("[+] {}", msg).green());
}

pub fn info(msg: impl std::fmt::Display) {
  println!("{} {}", stamp().dimmed(), format!("[*] {}", msg).blue());
}

pub fn warn(msg: impl std::fmt::Display) {
  eprintln!("{} {}", stamp().dimmed(), format!("[!] {}", msg).yellow());
}

pub fn error(msg: impl std::fmt::Display) {
  eprintln!("{} {}", stamp().dimmed(), format!("[-] {}", msg).red());
}

pub fn debug(msg: impl std::fmt::Display) {
  if debug_enabled() {
    println!("{} {}", stamp().dimmed(), format!("[~] {}", msg).dimmed());
  }
}
