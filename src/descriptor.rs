use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gnsspack::structs::descriptor::Metadata;

pub fn load_descriptor(path: &Path) -> Result<Metadata> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Could not read descriptor {}", path.display()))?;
    parse_descriptor(&text).with_context(|| format!("Invalid descriptor {}", path.display()))
}

pub fn parse_descriptor(text: &str) -> Result<Metadata> {
    let metadata: Metadata = serde_yaml_ng::from_str(text)?;
    log::debug!(
        "Descriptor: {} system(s), {} band(s), {} file(s), {} lane(s)",
        metadata.systems.len(),
        metadata.bands.len(),
        metadata.files.len(),
        metadata.lanes.len()
    );
    Ok(metadata)
}

/// Directory the descriptor's file URLs resolve against.
pub fn path_prefix(descriptor: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(prefix) => prefix.to_path_buf(),
        None => descriptor
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    }
}

#[cfg(test)]
pub(crate) const EXAMPLE_DESCRIPTOR: &str = r#"
systems:
  - id: rx
    base_frequency: 4092000.0
bands:
  - id: L1
    center_frequency: 1575420000.0
    translated_frequency: 4092000.0
files:
  - url: l1.bin
    lane: lane1
lanes:
  - id: lane1
    systems: [rx]
    blocks:
      - chunks:
          - size_word: 1
            count_words: 1
            lumps:
              - streams:
                  - id: L1-IQ
                    rate_factor: 2
                    packed_bits: 8
                    quantization: 2
                    format: IQ
                    encoding: SMA
                    bands: [L1]
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use gnsspack::structs::format::{
        Alignment, ChunkPadding, Endian, SampleEncoding, SampleFormat, Shift,
    };

    #[test]
    fn omitted_fields_take_defaults() -> Result<()> {
        let md = parse_descriptor(EXAMPLE_DESCRIPTOR)?;

        assert_eq!(md.files[0].offset, 0);
        let block = &md.lanes[0].blocks[0];
        assert_eq!((block.cycles, block.size_header, block.size_footer), (0, 0, 0));

        let chunk = &block.chunks[0];
        assert_eq!(chunk.endian, Endian::Big);
        assert_eq!(chunk.shift, Shift::Left);
        assert_eq!(chunk.padding, ChunkPadding::None);

        let stream = &chunk.lumps[0].streams[0];
        assert_eq!(stream.alignment, Alignment::Undefined);
        assert_eq!(stream.format, SampleFormat::IQ);
        assert_eq!(stream.encoding, SampleEncoding::Sma);
        assert_eq!(md.bands[0].delay_bias, 0.0);
        Ok(())
    }

    #[test]
    fn attribute_spelling() -> Result<()> {
        let md = parse_descriptor(concat!(
            "lanes:\n",
            "  - id: a\n",
            "    blocks:\n",
            "      - chunks:\n",
            "          - endian: little\n",
            "            shift: right\n",
            "            padding: tail\n",
        ))?;
        let chunk = &md.lanes[0].blocks[0].chunks[0];
        assert_eq!(chunk.endian, Endian::Little);
        assert_eq!(chunk.shift, Shift::Right);
        assert_eq!(chunk.padding, ChunkPadding::Tail);
        assert_eq!(chunk.size_word, 1);

        let misspelt = concat!(
            "lanes:\n",
            "  - id: a\n",
            "    blocks:\n",
            "      - chunks:\n",
            "          - shift: up\n",
        );
        assert!(parse_descriptor(misspelt).is_err());
        Ok(())
    }

    #[test]
    fn prefix_defaults_to_descriptor_directory() {
        assert_eq!(
            path_prefix(Path::new("/data/rec/session.yaml"), None),
            PathBuf::from("/data/rec")
        );
        assert_eq!(
            path_prefix(Path::new("session.yaml"), Some(Path::new("/mnt"))),
            PathBuf::from("/mnt")
        );
    }
}
