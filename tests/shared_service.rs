mod support;

use glyco::config::TrainingSettings;
use glyco::features::FeatureVector;
use glyco::inference::{self, ServiceState};
use glyco::session::{Session, SessionState};
use glyco::training;
use support::dataset::{REFERENCE_ROW, write_synthetic_csv};
use tempfile::tempdir;

// The shared service is process-wide, so the whole lifecycle lives in one test.
#[test]
fn shared_service_initializes_once() {
    let dir = tempdir().unwrap();
    let model_path = dir.path().join("diabetes_model.json");
    assert_eq!(inference::state(), ServiceState::Uninitialized);
    assert!(inference::init_shared(&model_path).is_err());
    assert_eq!(inference::state(), ServiceState::Uninitialized);

    let csv = write_synthetic_csv(dir.path(), 150, 5);
    let settings = TrainingSettings {
        n_trees: 20,
        ..TrainingSettings::default()
    };
    training::run(&csv, &model_path, &settings).unwrap();

    let service = inference::init_shared(&model_path).unwrap();
    assert_eq!(inference::state(), ServiceState::Ready);
    let again = inference::init_shared(&dir.path().join("elsewhere.json")).unwrap();
    assert!(std::ptr::eq(service, again));

    let mut session = Session::new();
    let reference = FeatureVector::from_array(REFERENCE_ROW);
    let shown = session.submit(reference, service).unwrap();
    assert_eq!(shown, service.predict(&reference));
    session.reset().unwrap();
    assert_eq!(
        session.state(),
        &SessionState::AwaitingInput { draft: reference }
    );
    assert!(inference::shared().is_some());
}
