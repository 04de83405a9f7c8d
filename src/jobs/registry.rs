//! # Registro de Jobs en Memoria
//! src/jobs/registry.rs
//!
//! Mapa `job_id → Job` compartido entre los threads HTTP y los workers.
//! No hay persistencia ni límite de tamaño: los jobs viven lo que vive el
//! proceso.

use crate::jobs::types::Job;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Registro thread-safe de jobs
#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<Mutex<HashMap<String, Job>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Un worker que hace panic no debe dejar el registro inutilizable
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Job>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserta el job si su ID está libre. Retorna false si ya existía.
    pub fn insert(&self, job: Job) -> bool {
        let mut jobs = self.lock();
        if jobs.contains_key(&job.id) {
            return false;
        }
        jobs.insert(job.id.clone(), job);
        true
    }

    /// Copia del job
    pub fn get(&self, job_id: &str) -> Option<Job> {
        self.lock().get(job_id).cloned()
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.lock().contains_key(job_id)
    }

    /// Aplica `f` al job bajo el lock. Retorna false si no existe.
    pub fn update<F>(&self, job_id: &str, f: F) -> bool
    where
        F: FnOnce(&mut Job),
    {
        match self.lock().get_mut(job_id) {
            Some(job) => {
                f(job);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::types::JobStatus;
    use std::thread;

    #[test]
    fn test_insert_and_get() {
        let registry = JobRegistry::new();
        assert!(registry.is_empty());

        assert!(registry.insert(Job::new("a".to_string())));
        assert!(!registry.insert(Job::new("a".to_string())));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a").unwrap().status, JobStatus::Queued);
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_update() {
        let registry = JobRegistry::new();
        registry.insert(Job::new("a".to_string()));

        assert!(registry.update("a", |job| job.mark_running()));
        assert!(!registry.update("missing", |job| job.mark_running()));
        assert_eq!(registry.get("a").unwrap().status, JobStatus::Running);
    }

    #[test]
    fn test_concurrent_updates() {
        let registry = JobRegistry::new();
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let registry = registry.clone();
                thread::spawn(move || {
                    let id = format!("job-{}", i);
                    registry.insert(Job::new(id.clone()));
                    registry.update(&id, |job| job.mark_done(format!("/results/{}.glb", id)));
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.len(), 16);
        for i in 0..16 {
            assert_eq!(registry.get(&format!("job-{}", i)).unwrap().status, JobStatus::Done);
        }
    }

    #[test]
    fn test_survives_poisoned_lock() {
        let registry = JobRegistry::new();
        registry.insert(Job::new("a".to_string()));

        let poisoner = registry.clone();
        let _ = thread::spawn(move || {
            poisoner.update("a", |_| panic!("worker crashed"));
        })
        .join();

        assert!(registry.contains("a"));
    }
}
