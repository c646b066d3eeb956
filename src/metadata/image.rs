//! A parsed ECMA-335 metadata image.
//!
//! Assemblies and portable PDBs share the same container: a `BSJB` root followed by heaps and
//! a compressed tables stream. [`MetadataImage`] parses that container once and gives typed,
//! borrowing access to it; [`crate::metadata::cilmodule::CilModule`] and
//! [`crate::metadata::portablepdb::PortablePdb`] each own one.

use crate::{
    metadata::{
        root::Root,
        streams::{Blob, Guid, PdbStream, Strings, TablesHeader},
        tables::{MetadataTable, RowReadable},
    },
    Error::NotSupported,
    Result,
};

/// Borrowed views of the streams of one metadata image.
pub struct MetadataImage<'a> {
    /// The metadata root with the stream directory
    pub root: Root,
    /// The `#~` stream
    pub tables: TablesHeader<'a>,
    /// The `#Strings` heap
    pub strings: Option<Strings<'a>>,
    /// The `#Blob` heap
    pub blobs: Option<Blob<'a>>,
    /// The `#GUID` heap
    pub guids: Option<Guid<'a>>,
    /// The `#Pdb` stream; present in portable PDBs only
    pub pdb: Option<PdbStream>,
}

impl<'a> MetadataImage<'a> {
    /// Parses the metadata image starting at the `BSJB` root in `data`.
    ///
    /// Empty streams are skipped. The uncompressed `#-` table layout is rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if the root or any stream is malformed, if the image has no `#~`
    /// stream, or [`crate::Error::NotSupported`] for `#-` images.
    pub fn read(data: &'a [u8]) -> Result<MetadataImage<'a>> {
        let root = Root::read(data)?;

        let mut tables = None;
        let mut strings = None;
        let mut blobs = None;
        let mut guids = None;
        let mut pdb = None;

        // #Pdb sizes the indexes of #~, so it has to be read first
        if let Some(header) = root.stream("#Pdb") {
            let start = header.offset as usize;
            pdb = Some(PdbStream::from(&data[start..start + header.size as usize])?);
        }

        for stream in &root.stream_headers {
            if stream.size == 0 {
                continue;
            }

            let start = stream.offset as usize;
            let stream_data = &data[start..start + stream.size as usize];

            match stream.name.as_str() {
                "#~" => {
                    let referenced = pdb.as_ref().map(|pdb| &pdb.referenced_rows);
                    tables = Some(TablesHeader::from(stream_data, referenced)?);
                }
                "#-" => return Err(NotSupported),
                "#Strings" => strings = Some(Strings::from(stream_data)?),
                "#Blob" => blobs = Some(Blob::from(stream_data)?),
                "#GUID" => guids = Some(Guid::from(stream_data)?),
                _ => {}
            }
        }

        let Some(tables) = tables else {
            return Err(malformed_error!("Metadata image has no #~ stream"));
        };

        Ok(MetadataImage {
            root,
            tables,
            strings,
            blobs,
            guids,
            pdb,
        })
    }

    /// Returns the `#Strings` entry at `index`; index 0 is the empty string.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is invalid or the heap is missing.
    pub fn string(&self, index: u32) -> Result<&'a str> {
        if index == 0 {
            return Ok("");
        }

        match &self.strings {
            Some(strings) => strings.get(index as usize),
            None => Err(malformed_error!("String index {} without #Strings heap", index)),
        }
    }

    /// Returns the `#Blob` entry at `index`; index 0 is the empty blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is invalid or the heap is missing.
    pub fn blob(&self, index: u32) -> Result<&'a [u8]> {
        if index == 0 {
            return Ok(&[]);
        }

        match &self.blobs {
            Some(blobs) => blobs.get(index as usize),
            None => Err(malformed_error!("Blob index {} without #Blob heap", index)),
        }
    }

    /// Returns the `#GUID` entry at the 1-based `index`, `None` for the null index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is past the heap or the heap is missing.
    pub fn guid(&self, index: u32) -> Result<Option<uguid::Guid>> {
        if index == 0 {
            return Ok(None);
        }

        match &self.guids {
            Some(guids) => guids.get(index as usize).map(Some),
            None => Err(malformed_error!("GUID index {} without #GUID heap", index)),
        }
    }

    /// Returns a typed view of a table, or `None` if the image does not contain it.
    #[must_use]
    pub fn table<T: RowReadable>(&self) -> Option<MetadataTable<'a, T>> {
        self.tables.table::<T>()
    }

    /// Reads a single row by its 1-based row id.
    #[must_use]
    pub fn row<T: RowReadable>(&self, rid: u32) -> Option<T> {
        self.table::<T>()?.get(rid)
    }

    /// Number of rows of the table `T` holds.
    #[must_use]
    pub fn row_count<T: RowReadable>(&self) -> u32 {
        self.tables.table_row_count(T::TABLE)
    }
}
