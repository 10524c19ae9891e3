use std::fs::{self as std_fs, FileTimes};
use std::io;
use std::path::Path;

use compio::fs::File;
use compio::io::{AsyncReadAt, AsyncWriteAtExt};

/// Size of the buffer each read and write goes through.
const COPY_CHUNK_SIZE: usize = 64 * 1024;

/// Copies `source` to `destination` and gives the copy the source's access
/// and modification times and permissions.
///
/// Times are applied before permissions, so a read-only source still yields
/// a copy with matching times.
pub async fn copy_preserving_times(source: &Path, destination: &Path) -> io::Result<u64> {
    let metadata = std_fs::metadata(source)?;
    let reader = File::open(source).await?;
    let mut writer = File::create(destination).await?;

    let mut buffer = Vec::with_capacity(COPY_CHUNK_SIZE);
    let mut offset: u64 = 0;
    loop {
        let res = reader.read_at(buffer, offset).await;
        buffer = res.1;
        let read = res.0?;
        if read == 0 {
            break;
        }

        let res = writer.write_all_at(buffer, offset).await;
        buffer = res.1;
        res.0?;

        buffer.clear();
        offset += read as u64;
    }
    writer.close().await?;
    reader.close().await?;

    let mut times = FileTimes::new().set_modified(metadata.modified()?);
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    let copy = std_fs::File::options().write(true).open(destination)?;
    copy.set_times(times)?;
    copy.set_permissions(metadata.permissions())?;

    Ok(offset)
}
