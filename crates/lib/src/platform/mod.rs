//! Host detection and well-known directories.
//!
//! The host only supplies defaults: every value detected here can be
//! overridden by a profile or a `-s axis=value` assignment.

pub mod os;
pub mod paths;

use std::fmt;

pub use os::Os;

use crate::settings::SettingsAxis;

/// CPU architectures with a known `arch` settings value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
  X86,
  X86_64,
  Armv7,
  Aarch64,
}

impl Arch {
  /// Map a Rust `target_arch` name onto a settings architecture.
  pub fn from_target_arch(name: &str) -> Option<Self> {
    match name {
      "x86" => Some(Self::X86),
      "x86_64" => Some(Self::X86_64),
      "arm" => Some(Self::Armv7),
      "aarch64" => Some(Self::Aarch64),
      _ => None,
    }
  }

  pub fn current() -> Option<Self> {
    Self::from_target_arch(std::env::consts::ARCH)
  }

  /// The `arch` settings value, also emitted as `CMAKE_SYSTEM_PROCESSOR`.
  pub fn settings_value(&self) -> &'static str {
    match self {
      Self::X86 => "x86",
      Self::X86_64 => "x86_64",
      Self::Armv7 => "armv7",
      Self::Aarch64 => "aarch64",
    }
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.settings_value())
  }
}

/// The machine cairn runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Host {
  pub os: Os,
  pub arch: Arch,
}

impl Host {
  /// `None` when either the OS or the CPU has no settings value.
  pub fn detect() -> Option<Self> {
    Some(Self {
      os: Os::current()?,
      arch: Arch::current()?,
    })
  }

  /// Settings this host implies: its OS, its CPU and the compiler the OS ships.
  pub fn default_settings(&self) -> [(SettingsAxis, &'static str); 3] {
    [
      (SettingsAxis::Os, self.os.as_str()),
      (SettingsAxis::Arch, self.arch.settings_value()),
      (SettingsAxis::Compiler, self.os.default_compiler()),
    ]
  }
}

impl fmt::Display for Host {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}", self.arch, self.os)
  }
}
