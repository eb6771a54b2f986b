#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Upper bound on concurrent in-flight fetches within one generation,
    /// there to respect downstream API rate limits.
    pub max_concurrency: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 10,
        }
    }
}
