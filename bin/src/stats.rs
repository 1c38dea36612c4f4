#[derive(Debug)]
pub(crate) struct ProcessingStats {
    pub(crate) total_files: usize,
    pub(crate) processed: usize,
    pub(crate) failed: usize,
    pub(crate) total_contours: usize,
    pub(crate) total_blocks: usize,
}

impl ProcessingStats {
    pub(crate) fn new(total_files: usize) -> Self {
        Self {
            total_files,
            processed: 0,
            failed: 0,
            total_contours: 0,
            total_blocks: 0,
        }
    }

    pub(crate) fn print_progress(&self) {
        println!(
            "Progress: {}/{} files processed, {} failed, {} contours traced",
            self.processed + self.failed,
            self.total_files,
            self.failed,
            self.total_contours
        );
    }

    pub(crate) fn print_summary(&self) {
        println!("\n=== Processing Summary ===");
        println!("Total files: {}", self.total_files);
        println!("Successfully processed: {}", self.processed);
        println!("Failed: {}", self.failed);
        println!("Total contours traced: {}", self.total_contours);
        println!("Total mask components: {}", self.total_blocks);
        println!("Success rate: {:.1}%",
                 (self.processed as f64 / self.total_files as f64) * 100.0);
    }
}
