// projeto: lstmfit
// file: src/logging.rs
// Espelha a saída de log no terminal e num arquivo por execução

use env_logger::{Builder, Target};
use log::LevelFilter;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

pub struct TeeWriter {
    file: File,
}

impl TeeWriter {
    pub fn new(file: File) -> Self {
        Self { file }
    }
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()?;
        self.file.flush()
    }
}

pub fn init(log_path: &Path) -> io::Result<()> {
    let file = File::create(log_path)?;
    let mut builder = Builder::from_default_env();
    builder
        .filter_level(LevelFilter::Info)
        .target(Target::Pipe(Box::new(TeeWriter::new(file))));
    // try_init: a second invocation in the same process keeps the first logger
    let _ = builder.try_init();
    Ok(())
}
