use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

// hdrl and INFO sit directly under the RIFF root; deeper lists (strl, odml)
// carry no dates.
const MAX_LIST_DEPTH: usize = 1;
const MAX_TEXT_CHUNK: u64 = 256;

#[derive(Debug, Default)]
struct RiffDates {
    idit: Option<String>,
    icrd: Option<String>,
}

/// Whether `path` starts with a `RIFF....AVI ` header.
pub(crate) fn is_avi(path: &Path) -> bool {
    let Ok(mut file) = File::open(path) else {
        return false;
    };
    let mut header = [0u8; 12];
    file.read_exact(&mut header).is_ok() && has_avi_header(&header)
}

/// Raw creation date text of an AVI file: the `IDIT` chunk of `LIST hdrl`,
/// or `ICRD` from `LIST INFO` when there is no `IDIT`.
pub(crate) fn read_avi_date_text(path: &Path) -> Option<String> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "could not open AVI");
            return None;
        }
    };
    let mut reader = BufReader::new(file);

    let mut header = [0u8; 12];
    if reader.read_exact(&mut header).is_err() || !has_avi_header(&header) {
        return None;
    }
    let riff_len = u64::from(le_u32(&header[4..8]));

    let mut dates = RiffDates::default();
    if let Err(err) = walk_chunks(&mut reader, riff_len.saturating_sub(4), 0, &mut dates) {
        debug!(path = %path.display(), error = %err, "RIFF chunk walk stopped early");
    }
    dates.idit.or(dates.icrd)
}

fn walk_chunks<R: Read + Seek>(
    reader: &mut R,
    mut remaining: u64,
    depth: usize,
    dates: &mut RiffDates,
) -> io::Result<()> {
    while remaining >= 8 && dates.idit.is_none() {
        let mut head = [0u8; 8];
        reader.read_exact(&mut head)?;
        let id = [head[0], head[1], head[2], head[3]];
        let size = u64::from(le_u32(&head[4..8]));
        let padded = size + (size & 1);
        remaining = remaining.saturating_sub(8 + padded);

        match &id {
            b"LIST" if size >= 4 => {
                let mut list_type = [0u8; 4];
                reader.read_exact(&mut list_type)?;
                let wanted = &list_type == b"hdrl" || &list_type == b"INFO";
                if wanted && depth < MAX_LIST_DEPTH {
                    walk_chunks(reader, padded - 4, depth + 1, dates)?;
                } else {
                    skip(reader, padded - 4)?;
                }
            }
            b"IDIT" | b"ICRD" => {
                let take = size.min(MAX_TEXT_CHUNK);
                let mut data = vec![0u8; take as usize];
                reader.read_exact(&mut data)?;
                skip(reader, padded - take)?;

                let text = String::from_utf8_lossy(&data)
                    .trim_matches(|c: char| c == '\0' || c.is_whitespace())
                    .to_string();
                if text.is_empty() {
                    continue;
                }
                if &id == b"IDIT" {
                    dates.idit = Some(text);
                } else if dates.icrd.is_none() {
                    dates.icrd = Some(text);
                }
            }
            _ => skip(reader, padded)?,
        }
    }

    if dates.idit.is_none() && remaining > 0 {
        skip(reader, remaining)?;
    }
    Ok(())
}

fn skip<R: Seek>(reader: &mut R, n: u64) -> io::Result<()> {
    let offset = i64::try_from(n)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "RIFF chunk size overflow"))?;
    reader.seek(SeekFrom::Current(offset))?;
    Ok(())
}

fn has_avi_header(header: &[u8; 12]) -> bool {
    &header[0..4] == b"RIFF" && &header[8..12] == b"AVI "
}

fn le_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[cfg(test)]
pub(crate) fn riff_chunk(id: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = id.to_vec();
    let len = u32::try_from(body.len()).expect("chunk fits");
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(body);
    if body.len() % 2 == 1 {
        out.push(0);
    }
    out
}

#[cfg(test)]
pub(crate) fn riff_list(list_type: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    let mut body = list_type.to_vec();
    for child in children {
        body.extend_from_slice(child);
    }
    riff_chunk(b"LIST", &body)
}

/// Builds an AVI whose `LIST hdrl` carries `idit`, followed by a tiny `movi`.
#[cfg(test)]
pub(crate) fn avi_with_idit(idit: &str) -> Vec<u8> {
    let hdrl = riff_list(
        b"hdrl",
        &[riff_chunk(b"avih", &[0u8; 56]), riff_chunk(b"IDIT", idit.as_bytes())],
    );
    let movi = riff_list(b"movi", &[riff_chunk(b"00dc", &[1, 2, 3, 4])]);
    avi_file(&[hdrl, movi])
}

#[cfg(test)]
pub(crate) fn avi_file(chunks: &[Vec<u8>]) -> Vec<u8> {
    let mut body = b"AVI ".to_vec();
    for chunk in chunks {
        body.extend_from_slice(chunk);
    }
    riff_chunk(b"RIFF", &body)
}

#[cfg(test)]
mod tests {
    use super::{avi_file, avi_with_idit, is_avi, read_avi_date_text, riff_chunk, riff_list};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn reads_idit_from_hdrl() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("clip.avi");
        fs::write(&path, avi_with_idit("Tue Jan 02 03:04:05 2024\n\0")).expect("write avi");

        assert!(is_avi(&path));
        assert_eq!(
            read_avi_date_text(&path).as_deref(),
            Some("Tue Jan 02 03:04:05 2024")
        );
    }

    #[test]
    fn falls_back_to_info_icrd_after_skipping_movi() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("clip.avi");
        let hdrl = riff_list(b"hdrl", &[riff_chunk(b"avih", &[0u8; 56])]);
        let movi = riff_list(b"movi", &[riff_chunk(b"00dc", &[9; 7])]);
        let info = riff_list(
            b"INFO",
            &[
                riff_chunk(b"ISFT", b"Lavf58\0"),
                riff_chunk(b"ICRD", b"2021-03-04 05:06:07\0"),
            ],
        );
        fs::write(&path, avi_file(&[hdrl, movi, info])).expect("write avi");

        assert_eq!(
            read_avi_date_text(&path).as_deref(),
            Some("2021-03-04 05:06:07")
        );
    }

    #[test]
    fn non_riff_and_dateless_files_yield_none() {
        let temp = tempdir().expect("tempdir");
        let plain = temp.path().join("clip.avi");
        fs::write(&plain, b"not a riff file at all").expect("write plain");
        let dateless = temp.path().join("dateless.avi");
        fs::write(
            &dateless,
            avi_file(&[riff_list(b"hdrl", &[riff_chunk(b"avih", &[0u8; 56])])]),
        )
        .expect("write dateless");
        let truncated = temp.path().join("truncated.avi");
        let mut bytes = avi_with_idit("Tue Jan 02 03:04:05 2024");
        bytes.truncate(40);
        fs::write(&truncated, bytes).expect("write truncated");

        assert!(!is_avi(&plain));
        assert!(read_avi_date_text(&plain).is_none());
        assert!(read_avi_date_text(&dateless).is_none());
        assert!(read_avi_date_text(&truncated).is_none());
    }
}
