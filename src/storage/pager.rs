use std::{
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::types::{
    PAGE_SIZE, PageId, TABLE_MAX_PAGES,
    error::{DatabaseError, Result},
    page::Page,
};

/// State of one page index.
#[derive(Debug)]
enum Frame {
    /// Past the high-water mark; nothing has ever been written here.
    Unallocated,
    /// Present in the file but not read yet.
    OnDisk,
    Cached(Page),
}

pub struct Pager {
    path: PathBuf,
    file: File,
    file_length: u64,
    frames: Vec<Frame>,
    num_pages: usize,
}

impl Pager {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let file_length = file.metadata()?.len();
        if file_length % PAGE_SIZE as u64 != 0 {
            return Err(DatabaseError::CorruptFile {
                length: file_length,
            });
        }
        let pages_in_file = file_length / PAGE_SIZE as u64;
        if pages_in_file > TABLE_MAX_PAGES as u64 {
            return Err(DatabaseError::TooManyPages {
                pages: pages_in_file,
                max: TABLE_MAX_PAGES,
            });
        }
        let num_pages = pages_in_file as usize;
        let frames = (0..TABLE_MAX_PAGES)
            .map(|index| {
                if index < num_pages {
                    Frame::OnDisk
                } else {
                    Frame::Unallocated
                }
            })
            .collect();
        info!(path = %path.display(), pages = num_pages, "opened database file");
        Ok(Self {
            path: path.to_path_buf(),
            file,
            file_length,
            frames,
            num_pages,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of pages ever touched: one past the highest page index.
    pub fn num_pages(&self) -> usize {
        self.num_pages
    }

    pub fn file_length(&self) -> u64 {
        self.file_length
    }

    pub fn is_cached(&self, page_num: PageId) -> bool {
        matches!(self.frames.get(page_num as usize), Some(Frame::Cached(_)))
    }

    /// Returns the cached buffer for `page_num`, loading it on first use.
    /// The page right past the high-water mark is created zeroed; anything
    /// further out is `PageNotAllocated`, so the file never has holes.
    pub fn get_page(&mut self, page_num: PageId) -> Result<&mut Page> {
        let index = page_num as usize;
        if index >= TABLE_MAX_PAGES {
            return Err(DatabaseError::PageOutOfBounds {
                page_num,
                max: TABLE_MAX_PAGES,
            });
        }
        if index > self.num_pages {
            return Err(DatabaseError::PageNotAllocated {
                page_num,
                num_pages: self.num_pages,
            });
        }
        let frame = &mut self.frames[index];
        match frame {
            Frame::Cached(_) => {}
            Frame::OnDisk => {
                let mut page = Page::new();
                self.file
                    .seek(SeekFrom::Start(index as u64 * PAGE_SIZE as u64))?;
                self.file.read_exact(page.as_bytes_mut())?;
                debug!(page_num, "loaded page from disk");
                *frame = Frame::Cached(page);
            }
            Frame::Unallocated => {
                *frame = Frame::Cached(Page::new());
                self.num_pages = index + 1;
            }
        }
        match frame {
            Frame::Cached(page) => Ok(page),
            _ => Err(DatabaseError::corrupt_node(
                page_num,
                "page frame was not cached after load",
            )),
        }
    }

    /// Errors with `TableFull` unless `pages` more pages can be allocated.
    pub fn ensure_capacity(&self, pages: usize) -> Result<()> {
        if self.num_pages + pages > TABLE_MAX_PAGES {
            return Err(DatabaseError::TableFull);
        }
        Ok(())
    }

    /// Hands out the next page past the high-water mark as a zeroed buffer.
    /// The caller initializes its node header.
    pub fn allocate_new_page(&mut self) -> Result<PageId> {
        self.ensure_capacity(1)?;
        let page_num = self.num_pages as PageId;
        self.frames[self.num_pages] = Frame::Cached(Page::new());
        self.num_pages += 1;
        debug!(page_num, "allocated page");
        Ok(page_num)
    }

    /// Writes every cached page back to its slot in the file.
    pub fn flush_all(&mut self) -> Result<()> {
        let mut written = 0;
        for (index, frame) in self.frames.iter().take(self.num_pages).enumerate() {
            if let Frame::Cached(page) = frame {
                self.file
                    .seek(SeekFrom::Start(index as u64 * PAGE_SIZE as u64))?;
                self.file.write_all(page.as_bytes())?;
                written += 1;
            }
        }
        self.file.flush()?;
        self.file.sync_all()?;
        self.file_length = self.file.metadata()?.len();
        debug!(written, "flushed pages");
        Ok(())
    }

    /// Flushes and releases the file. The handle is dropped on every path,
    /// including a failed flush.
    pub fn close(mut self) -> Result<()> {
        let result = self.flush_all();
        info!(path = %self.path.display(), pages = self.num_pages, "closed database file");
        result
    }
}
