use gstrecon_core::ReconciliationResult;
use thiserror::Error;

use crate::backend::{BackendError, ReconBackend};
use crate::types::{Dataset, InputFile, MissingPreview, UploadSummary};
use crate::validate::{validate_csv_name, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    Upload = 1,
    Process = 2,
    Review = 3,
    Reconcile = 4,
    Results = 5,
}

impl Step {
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::Upload => "Upload Files",
            Step::Process => "Process Data",
            Step::Review => "Review Data",
            Step::Reconcile => "Reconcile",
            Step::Results => "Results",
        }
    }
}

/// Identifies one reconcile request. A completion carrying an older ticket
/// than the one the workflow expects is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Every input that failed the name check, GST first.
    #[error("{}", invalid_inputs(.0))]
    Validation(Vec<(Dataset, ValidationError)>),
    #[error("{dataset} upload failed: {source}")]
    Upload {
        dataset: Dataset,
        #[source]
        source: BackendError,
    },
    #[error("Reconciliation failed: {0}")]
    Reconcile(#[source] BackendError),
    #[error("Preview failed: {0}")]
    Preview(#[source] BackendError),
    #[error("'{action}' is not available at step {}", .step.number())]
    WrongStep { action: &'static str, step: Step },
}

fn invalid_inputs(errors: &[(Dataset, ValidationError)]) -> String {
    errors
        .iter()
        .map(|(dataset, e)| format!("{dataset}: {e}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Upload → process → review → reconcile → results. Failures roll back to the step
/// the action started from.
pub struct Workflow<B: ReconBackend> {
    backend: B,
    step: Step,
    gst: Option<UploadSummary>,
    apar: Option<UploadSummary>,
    preview: Option<MissingPreview>,
    result: Option<ReconciliationResult>,
    issued: u64,
    pending: Option<Ticket>,
}

impl<B: ReconBackend> Workflow<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            step: Step::Upload,
            gst: None,
            apar: None,
            preview: None,
            result: None,
            issued: 0,
            pending: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn upload_summary(&self, dataset: Dataset) -> Option<&UploadSummary> {
        match dataset {
            Dataset::Gst => self.gst.as_ref(),
            Dataset::Apar => self.apar.as_ref(),
        }
    }

    pub fn preview(&self) -> Option<&MissingPreview> {
        self.preview.as_ref()
    }

    pub fn result(&self) -> Option<&ReconciliationResult> {
        self.result.as_ref()
    }

    fn require(&self, step: Step, action: &'static str) -> Result<(), WorkflowError> {
        if self.step == step {
            Ok(())
        } else {
            Err(WorkflowError::WrongStep {
                action,
                step: self.step,
            })
        }
    }

    /// Upload both datasets, GST first. The workflow sits at `Process` while
    /// the requests are in flight. Either failure discards both summaries.
    pub async fn upload(&mut self, gst: &InputFile, apar: &InputFile) -> Result<(), WorkflowError> {
        self.require(Step::Upload, "upload")?;
        let invalid: Vec<_> = [(Dataset::Gst, gst), (Dataset::Apar, apar)]
            .into_iter()
            .filter_map(|(dataset, file)| validate_csv_name(&file.name).err().map(|e| (dataset, e)))
            .collect();
        if !invalid.is_empty() {
            return Err(WorkflowError::Validation(invalid));
        }

        self.step = Step::Process;
        let (gst_summary, apar_summary) = match self.upload_both(gst, apar).await {
            Ok(summaries) => summaries,
            Err(e) => {
                self.step = Step::Upload;
                return Err(e);
            }
        };
        for summary in [&gst_summary, &apar_summary] {
            if let Some(warning) = &summary.warning {
                tracing::warn!(%warning, "duplicate invoices in upload");
            }
        }
        self.gst = Some(gst_summary);
        self.apar = Some(apar_summary);
        self.step = Step::Review;
        tracing::info!("both datasets uploaded");
        Ok(())
    }

    async fn upload_both(
        &self,
        gst: &InputFile,
        apar: &InputFile,
    ) -> Result<(UploadSummary, UploadSummary), WorkflowError> {
        let gst_summary = self.upload_one(Dataset::Gst, gst).await?;
        let apar_summary = self.upload_one(Dataset::Apar, apar).await?;
        Ok((gst_summary, apar_summary))
    }

    async fn upload_one(&self, dataset: Dataset, file: &InputFile) -> Result<UploadSummary, WorkflowError> {
        self.backend.upload(dataset, file).await.map_err(|source| {
            tracing::warn!(%dataset, error = %source, "upload failed");
            WorkflowError::Upload { dataset, source }
        })
    }

    /// Fetch the missing-records preview. A failure leaves the workflow at review.
    pub async fn load_preview(&mut self) -> Result<&MissingPreview, WorkflowError> {
        self.require(Step::Review, "preview")?;
        match self.backend.preview_missing().await {
            Ok(preview) => Ok(&*self.preview.insert(preview)),
            Err(e) => {
                tracing::warn!(error = %e, "preview failed");
                Err(WorkflowError::Preview(e))
            }
        }
    }

    /// Enter the reconcile step and hand out the ticket its completion must carry.
    pub fn begin_reconcile(&mut self) -> Result<Ticket, WorkflowError> {
        self.require(Step::Review, "reconcile")?;
        self.issued += 1;
        let ticket = Ticket(self.issued);
        self.pending = Some(ticket);
        self.step = Step::Reconcile;
        Ok(ticket)
    }

    /// Deliver the outcome of a reconcile request. Returns `Ok(false)` when
    /// the ticket is stale and the outcome was ignored.
    pub fn complete_reconcile(
        &mut self,
        ticket: Ticket,
        outcome: Result<ReconciliationResult, BackendError>,
    ) -> Result<bool, WorkflowError> {
        if self.pending != Some(ticket) {
            tracing::debug!(?ticket, "ignoring stale reconcile completion");
            return Ok(false);
        }
        self.pending = None;
        match outcome {
            Ok(result) => {
                self.result = Some(result);
                self.step = Step::Results;
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(error = %e, "reconcile failed, back to review");
                self.step = Step::Review;
                Err(WorkflowError::Reconcile(e))
            }
        }
    }

    /// Run the reconcile request to completion.
    pub async fn reconcile(&mut self) -> Result<&ReconciliationResult, WorkflowError> {
        let ticket = self.begin_reconcile()?;
        let outcome = self.backend.reconcile().await;
        self.complete_reconcile(ticket, outcome)?;
        self.result
            .as_ref()
            .ok_or(WorkflowError::WrongStep { action: "reconcile", step: self.step })
    }

    /// Abandon an interrupted upload or an in-flight reconcile. Requests
    /// already sent are not aborted.
    pub fn cancel(&mut self) -> bool {
        match self.step {
            Step::Process => {
                self.step = Step::Upload;
                tracing::info!("upload cancelled");
                true
            }
            Step::Reconcile => {
                self.pending = None;
                self.step = Step::Review;
                tracing::info!("reconcile cancelled");
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.step = Step::Upload;
        self.gst = None;
        self.apar = None;
        self.preview = None;
        self.result = None;
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;

    fn files() -> (InputFile, InputFile) {
        (
            InputFile::new("gst.csv", "Invoice_No,GSTIN\n"),
            InputFile::new("apar.csv", "Invoice_No,GSTIN\n"),
        )
    }

    fn result() -> ReconciliationResult {
        let mut r = ReconciliationResult::default();
        r.summary.matched = 4;
        r
    }

    async fn at_review() -> Workflow<MockBackend> {
        let mut wf = Workflow::new(MockBackend::new(result()));
        let (gst, apar) = files();
        wf.upload(&gst, &apar).await.unwrap();
        wf
    }

    // ── upload ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn upload_moves_to_review() {
        let wf = at_review().await;
        assert_eq!(wf.step(), Step::Review);
        assert!(wf.upload_summary(Dataset::Gst).is_some());
        assert!(wf.upload_summary(Dataset::Apar).is_some());
        assert_eq!(
            wf.backend().uploads(),
            vec![
                (Dataset::Gst, "gst.csv".to_string()),
                (Dataset::Apar, "apar.csv".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn non_csv_rejected_before_network() {
        let mut wf = Workflow::new(MockBackend::new(result()));
        let (gst, _) = files();
        let apar = InputFile::new("apar.xlsx", "");
        let err = wf.upload(&gst, &apar).await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Validation(ref errors)
                if errors == &[(Dataset::Apar, ValidationError::NotCsv("apar.xlsx".into()))]
        ));
        assert!(wf.backend().uploads().is_empty());
        assert_eq!(wf.step(), Step::Upload);
    }

    #[tokio::test]
    async fn every_bad_name_is_reported() {
        let mut wf = Workflow::new(MockBackend::new(result()));
        let gst = InputFile::new("gst.txt", "");
        let apar = InputFile::new("apar.xlsx", "");
        let err = wf.upload(&gst, &apar).await.unwrap_err();
        match &err {
            WorkflowError::Validation(errors) => {
                let datasets: Vec<_> = errors.iter().map(|(d, _)| *d).collect();
                assert_eq!(datasets, vec![Dataset::Gst, Dataset::Apar]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            err.to_string(),
            "GST: Only CSV files are allowed: gst.txt; AP/AR: Only CSV files are allowed: apar.xlsx"
        );
        assert!(wf.backend().uploads().is_empty());
    }

    #[tokio::test]
    async fn failed_upload_stays_at_upload() {
        let backend = MockBackend::new(result()).with_upload(Err(BackendError::Http {
            status: 400,
            detail: "Missing required fields: GSTIN".into(),
        }));
        let mut wf = Workflow::new(backend);
        let (gst, apar) = files();
        let err = wf.upload(&gst, &apar).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "GST upload failed: HTTP 400: Missing required fields: GSTIN"
        );
        assert_eq!(wf.step(), Step::Upload);
        assert!(wf.upload_summary(Dataset::Gst).is_none());
    }

    // ── reconcile ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn reconcile_reaches_results() {
        let mut wf = at_review().await;
        assert_eq!(wf.reconcile().await.unwrap().summary.matched, 4);
        assert_eq!(wf.step(), Step::Results);
    }

    #[tokio::test]
    async fn reconcile_failure_reverts_to_review() {
        let backend = MockBackend::new(result())
            .with_reconcile(Err(BackendError::Network("connection refused".into())));
        let mut wf = Workflow::new(backend);
        let (gst, apar) = files();
        wf.upload(&gst, &apar).await.unwrap();
        assert!(matches!(wf.reconcile().await, Err(WorkflowError::Reconcile(_))));
        assert_eq!(wf.step(), Step::Review);
        assert!(wf.result().is_none());
    }

    #[tokio::test]
    async fn cancelled_completion_is_ignored() {
        let mut wf = at_review().await;
        let ticket = wf.begin_reconcile().unwrap();
        assert_eq!(wf.step(), Step::Reconcile);
        assert!(wf.cancel());
        assert_eq!(wf.step(), Step::Review);

        assert!(!wf.complete_reconcile(ticket, Ok(result())).unwrap());
        assert_eq!(wf.step(), Step::Review);
        assert!(wf.result().is_none());

        let fresh = wf.begin_reconcile().unwrap();
        assert_ne!(fresh, ticket);
        assert!(!wf.complete_reconcile(ticket, Ok(result())).unwrap());
        assert!(wf.complete_reconcile(fresh, Ok(result())).unwrap());
        assert_eq!(wf.step(), Step::Results);
    }

    #[tokio::test]
    async fn wrong_step_and_reset() {
        let mut wf = Workflow::new(MockBackend::new(result()));
        assert!(matches!(
            wf.begin_reconcile(),
            Err(WorkflowError::WrongStep { step: Step::Upload, .. })
        ));
        assert!(!wf.cancel());

        let mut wf = at_review().await;
        wf.load_preview().await.unwrap();
        wf.reconcile().await.unwrap();
        wf.reset();
        assert_eq!(wf.step(), Step::Upload);
        assert!(wf.result().is_none());
        assert!(wf.preview().is_none());
        assert!(wf.upload_summary(Dataset::Apar).is_none());
    }

    #[test]
    fn cancel_during_process_returns_to_upload() {
        let mut wf = Workflow::new(MockBackend::new(result()));
        wf.step = Step::Process;
        assert!(wf.cancel());
        assert_eq!(wf.step(), Step::Upload);
        assert!(wf.upload_summary(Dataset::Gst).is_none());
    }

    #[test]
    fn step_numbers() {
        assert_eq!(Step::Upload.number(), 1);
        assert_eq!(Step::Results.number(), 5);
        assert_eq!(Step::Review.title(), "Review Data");
    }
}
