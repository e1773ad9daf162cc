//! Lookup of named parts inside an `.xlsx` ZIP container

use crate::error::SheetLoaderError;
use crate::helpers::xml::XmlReader;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::ZipArchive;

pub(crate) trait ZipHelper<RS: Read + Seek> {
    /// Finds a part by name, ignoring ASCII case and normalizing `\` to `/`
    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, SheetLoaderError>;

    /// Opens a part as an XML event stream
    fn xml_reader(
        &'_ mut self,
        name: &str,
    ) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, SheetLoaderError>;
}

impl<RS: Read + Seek> ZipHelper<RS> for ZipArchive<RS> {
    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, SheetLoaderError> {
        let wanted = name.replace('\\', "/");
        let Some(stored) = self
            .file_names()
            .find(|stored| wanted.eq_ignore_ascii_case(&stored.replace('\\', "/")))
            .map(str::to_owned)
        else {
            return Ok(None);
        };
        match self.by_name(&stored) {
            Ok(file) => Ok(Some(file)),
            Err(ZipError::FileNotFound) => Ok(None),
            Err(error) => Err(error)?,
        }
    }

    fn xml_reader(
        &'_ mut self,
        name: &str,
    ) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, SheetLoaderError> {
        Ok(self.file(name)?.map(|file| XmlReader::new(BufReader::new(file))))
    }
}
