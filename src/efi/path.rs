// src/efi/path.rs

//! EFI system partition layout
//!
//! Resolves where each distribution keeps its boot binaries and converts
//! between OS paths (`/boot/efi/EFI/redhat/shimx64.efi`) and the firmware
//! device path form (`\EFI\redhat\shimx64.efi`) that boot entries store.

use super::entry::DevicePath;
use crate::distro::{DistroCatalog, DistroId};
use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Default mount point of the EFI system partition
pub const DEFAULT_ESP_MOUNT: &str = "/boot/efi";

/// Boot binaries to look for, highest priority first
///
/// `shimx64.efi` may be missing on systems without Secure Boot, but
/// `grubx64.efi` must exist for the system to boot at all.
pub const DEFAULT_CANDIDATES: &[&str] = &["shimx64.efi", "grubx64.efi"];

/// Where boot binaries live for one distribution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistroEfiLayout {
    pub distro_id: DistroId,
    pub efi_directory_path: PathBuf,
    pub candidate_binary_names: Vec<String>,
}

/// Path resolver bound to one mounted EFI system partition
#[derive(Debug, Clone)]
pub struct EfiLayout {
    esp_mount: PathBuf,
    candidates: Vec<String>,
    catalog: DistroCatalog,
}

impl EfiLayout {
    /// Create a layout with the default candidate list
    pub fn new(esp_mount: impl Into<PathBuf>, catalog: DistroCatalog) -> Self {
        Self {
            esp_mount: esp_mount.into(),
            candidates: DEFAULT_CANDIDATES.iter().map(|s| s.to_string()).collect(),
            catalog,
        }
    }

    /// Replace the candidate binary list
    pub fn with_candidates(mut self, candidates: Vec<String>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn esp_mount(&self) -> &Path {
        &self.esp_mount
    }

    pub fn catalog(&self) -> &DistroCatalog {
        &self.catalog
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Canonical EFI directory of a distribution
    pub fn efi_directory_for(&self, distro: &DistroId) -> Result<PathBuf> {
        let dir_name = self.catalog.efi_dir_name(distro)?;
        Ok(self.esp_mount.join("EFI").join(dir_name))
    }

    /// Full layout description of a distribution
    pub fn distro_layout(&self, distro: &DistroId) -> Result<DistroEfiLayout> {
        Ok(DistroEfiLayout {
            distro_id: distro.clone(),
            efi_directory_path: self.efi_directory_for(distro)?,
            candidate_binary_names: self.candidates.clone(),
        })
    }

    /// Device path of the first candidate binary present for `distro`
    pub fn resolve_target_binary(&self, distro: &DistroId) -> Result<Option<DevicePath>> {
        let layout = self.distro_layout(distro)?;

        for name in &layout.candidate_binary_names {
            let candidate = layout.efi_directory_path.join(name);
            if candidate.is_file() {
                debug!("Found boot binary {}", candidate.display());
                return self.to_device_path(&candidate).map(Some);
            }
            debug!("Boot binary {} not present", candidate.display());
        }

        Ok(None)
    }

    /// Convert a path under the ESP mount into firmware device path form
    pub fn to_device_path(&self, fs_path: &Path) -> Result<DevicePath> {
        if !fs_path.is_absolute() {
            return Err(Error::PathError(format!(
                "{} is not an absolute path",
                fs_path.display()
            )));
        }

        let relative = fs_path.strip_prefix(&self.esp_mount).map_err(|_| {
            Error::PathError(format!(
                "{} is outside the EFI system partition at {}",
                fs_path.display(),
                self.esp_mount.display()
            ))
        })?;

        let mut encoded = String::new();
        for component in relative.components() {
            let Component::Normal(part) = component else {
                return Err(Error::PathError(format!(
                    "{} contains a non-normal path component",
                    fs_path.display()
                )));
            };
            let part = part.to_str().ok_or_else(|| {
                Error::PathError(format!("{} is not valid UTF-8", fs_path.display()))
            })?;
            if part.contains('\\') {
                return Err(Error::PathError(format!(
                    "{} has a backslash in a component, which firmware reads as a separator",
                    fs_path.display()
                )));
            }
            encoded.push('\\');
            encoded.push_str(part);
        }

        if encoded.is_empty() {
            return Err(Error::PathError(format!(
                "{} is the EFI system partition root, not a file",
                fs_path.display()
            )));
        }

        DevicePath::new(encoded)
    }

    /// Convert a firmware device path back into a path under the ESP mount
    pub fn to_fs_path(&self, device_path: &DevicePath) -> Result<PathBuf> {
        let mut path = self.esp_mount.clone();

        for part in device_path.as_str().split('\\').skip(1) {
            if part.is_empty() || part == "." || part == ".." {
                return Err(Error::PathError(format!(
                    "Device path '{}' contains an invalid component",
                    device_path
                )));
            }
            path.push(part);
        }

        if path == self.esp_mount {
            return Err(Error::PathError(format!(
                "Device path '{}' does not name a file",
                device_path
            )));
        }

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> EfiLayout {
        EfiLayout::new(DEFAULT_ESP_MOUNT, DistroCatalog::builtin())
    }

    #[test]
    fn test_efi_directory_for() {
        let layout = layout();
        assert_eq!(
            layout.efi_directory_for(&DistroId::new("rhel")).unwrap(),
            PathBuf::from("/boot/efi/EFI/redhat")
        );
        assert_eq!(
            layout.efi_directory_for(&DistroId::new("almalinux")).unwrap(),
            PathBuf::from("/boot/efi/EFI/almalinux")
        );
        assert!(layout.efi_directory_for(&DistroId::new("unknown")).is_err());
    }

    #[test]
    fn test_to_device_path() {
        let path = layout()
            .to_device_path(Path::new("/boot/efi/EFI/redhat/shimx64.efi"))
            .unwrap();
        assert_eq!(path.as_str(), "\\EFI\\redhat\\shimx64.efi");
    }

    #[test]
    fn test_device_path_round_trip() {
        let layout = layout();
        let original = Path::new("/boot/efi/EFI/centos/grubx64.efi");
        let device = layout.to_device_path(original).unwrap();
        assert_eq!(layout.to_fs_path(&device).unwrap(), original);
    }

    #[test]
    fn test_backslash_in_component_rejected() {
        let layout = layout();
        let err = layout
            .to_device_path(Path::new("/boot/efi/EFI/a\\b.efi"))
            .unwrap_err();
        assert!(matches!(err, Error::PathError(_)));
    }

    #[test]
    fn test_paths_outside_esp_rejected() {
        let layout = layout();
        assert!(layout.to_device_path(Path::new("/boot/vmlinuz")).is_err());
        assert!(layout.to_device_path(Path::new("EFI/redhat/shimx64.efi")).is_err());
        assert!(layout.to_device_path(Path::new("/boot/efi/EFI/../../etc/passwd")).is_err());
        assert!(layout.to_device_path(Path::new("/boot/efi")).is_err());
    }

    #[test]
    fn test_to_fs_path_rejects_traversal() {
        let layout = layout();
        let device = DevicePath::new("\\EFI\\..\\..\\etc\\shadow").unwrap();
        assert!(layout.to_fs_path(&device).is_err());
        let device = DevicePath::new("\\").unwrap();
        assert!(layout.to_fs_path(&device).is_err());
    }

    #[test]
    fn test_resolve_prefers_shim() {
        let esp = tempfile::tempdir().unwrap();
        let dir = esp.path().join("EFI/almalinux");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("grubx64.efi"), b"grub").unwrap();
        std::fs::write(dir.join("shimx64.efi"), b"shim").unwrap();

        let layout = EfiLayout::new(esp.path(), DistroCatalog::builtin());
        let resolved = layout
            .resolve_target_binary(&DistroId::new("almalinux"))
            .unwrap()
            .unwrap();
        assert_eq!(resolved.as_str(), "\\EFI\\almalinux\\shimx64.efi");
    }

    #[test]
    fn test_resolve_falls_back_to_grub() {
        let esp = tempfile::tempdir().unwrap();
        let dir = esp.path().join("EFI/almalinux");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("grubx64.efi"), b"grub").unwrap();

        let layout = EfiLayout::new(esp.path(), DistroCatalog::builtin());
        let resolved = layout
            .resolve_target_binary(&DistroId::new("almalinux"))
            .unwrap()
            .unwrap();
        assert_eq!(resolved.as_str(), "\\EFI\\almalinux\\grubx64.efi");
    }

    #[test]
    fn test_resolve_ignores_other_shim_variants() {
        let esp = tempfile::tempdir().unwrap();
        let dir = esp.path().join("EFI/almalinux");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("shim.efi"), b"shim").unwrap();

        let layout = EfiLayout::new(esp.path(), DistroCatalog::builtin());
        assert!(
            layout
                .resolve_target_binary(&DistroId::new("almalinux"))
                .unwrap()
                .is_none()
        );
    }
}
