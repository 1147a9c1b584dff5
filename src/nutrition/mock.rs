use super::{LookupError, NutritionResult, NutritionService};
use crate::models::NutritionItem;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Canned nutrition service that records every query it receives.
#[derive(Clone)]
pub struct MockNutritionClient {
    responses: Arc<Mutex<Vec<NutritionResult>>>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl MockNutritionClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_items(self, items: Vec<NutritionItem>) -> Self {
        self.responses.lock().unwrap().push(Ok(items));
        self
    }

    pub fn with_error(self, error: LookupError) -> Self {
        self.responses.lock().unwrap().push(Err(error));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn get_queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl Default for MockNutritionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NutritionService for MockNutritionClient {
    async fn lookup(&self, query: &str) -> NutritionResult {
        let mut queries = self.queries.lock().unwrap();
        queries.push(query.to_string());

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(Vec::new())
        } else {
            let index = (queries.len() - 1) % responses.len();
            responses[index].clone()
        }
    }
}
