//! Reading the load base of a binary file.

use crate::Error;
use goblin::Object;
use std::fs;
use std::path::Path;

/// Get the address a binary's image is loaded at.
///
/// For Elf files this is the start of the first loadable segment. Loadable
/// segments appear in ascending order in the program header table. For PE
/// files this is the image base of the optional header.
pub fn image_base(bytes: &[u8]) -> Result<u64, Error> {
    match Object::parse(bytes)? {
        Object::Elf(elf) => elf
            .program_headers
            .iter()
            .find(|header| {
                header.p_type == goblin::elf::program_header::PT_LOAD
                    && !header.vm_range().is_empty()
            })
            .map(|header| header.p_vaddr)
            .ok_or_else(|| "No loadable segment found".into()),
        Object::PE(pe) => Ok(pe.image_base as u64),
        _ => Err("Unsupported binary format".into()),
    }
}

/// Get the address the image of the binary at `path` is loaded at.
pub fn image_base_from_file(path: &Path) -> Result<u64, Error> {
    image_base(&fs::read(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_is_not_a_binary() {
        assert!(image_base(&[0u8; 3]).is_err());
    }
}
