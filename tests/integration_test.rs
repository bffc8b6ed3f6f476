//! Integration tests for azure-vm-disk-sample
//!
//! These run the whole sample against the in-memory cloud and check what
//! ended up remote, and that the resource group is always cleaned up.

use azure_vm_disk_sample::config::{ResourceNames, SampleSettings};
use azure_vm_disk_sample::disk_plan::{DiskAttachStrategy, DiskPlan, PlannedDataDisk};
use azure_vm_disk_sample::models::PowerState;
use azure_vm_disk_sample::simulated::{Operation, IMAGE_OS_DISK_GB};
use azure_vm_disk_sample::{run_sample, Cleanup, SimulatedCloud, Step};
use std::collections::BTreeSet;

const SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000000";

fn settings(strategy: DiskAttachStrategy) -> SampleSettings {
    SampleSettings {
        strategy,
        disk_plan: DiskPlan::for_strategy(strategy),
        ..SampleSettings::default()
    }
}

fn luns(values: &[u32]) -> BTreeSet<u32> {
    values.iter().copied().collect()
}

#[tokio::test]
async fn test_full_workflow_mixed() {
    let cloud = SimulatedCloud::new(SUBSCRIPTION);
    let settings = settings(DiskAttachStrategy::Mixed);

    let report = run_sample(&cloud, &settings).await;

    assert!(report.succeeded(), "error: {:?}", report.error);
    assert_eq!(report.completed.len(), 9, "every step should complete");
    assert_eq!(report.created_luns, luns(&[0, 1, 2, 3, 4]));
    // LUNs 3 and 4 detached, the new 200 GB disk goes past the LUNs in use before
    assert_eq!(report.updated_luns, luns(&[0, 1, 2, 5]));
    assert!(!report.updated_luns.contains(&3) && !report.updated_luns.contains(&4));
    assert_eq!(cloud.call_count(Operation::CreateDisk), 3);
    assert_eq!(cloud.call_count(Operation::DeleteDisk), 1);
    assert!(report.deleted_disk.is_some());

    let os = report.resized.iter().find(|r| r.os_disk).expect("OS disk resized");
    assert_eq!(os.before_gb, IMAGE_OS_DISK_GB);
    assert_eq!(os.after_gb, IMAGE_OS_DISK_GB * 2);
    let data: Vec<_> = report.resized.iter().filter(|r| !r.os_disk).collect();
    assert_eq!(data.len(), 4);
    for r in data {
        assert_eq!(r.after_gb, r.before_gb + 10);
    }

    let vm = report.final_vm.as_ref().expect("final VM");
    assert_eq!(vm.power_state, Some(PowerState::Running));
    assert_eq!(vm.data_disk(5).and_then(|d| d.size_gb), Some(210));

    assert_eq!(
        report.cleanup,
        Cleanup::Deleted(report.resource_group.clone().expect("group created"))
    );
    assert_eq!(cloud.call_count(Operation::DeleteResourceGroup), 1);
    assert!(!cloud.resource_group_exists(&settings.names.resource_group));
    assert!(cloud.disks().is_empty());
    assert!(cloud.virtual_machines().is_empty());
}

#[tokio::test]
async fn test_detach_and_delete_scenario() {
    let cloud = SimulatedCloud::new(SUBSCRIPTION);
    let settings = SampleSettings {
        location: "EastUS".to_string(),
        names: ResourceNames {
            resource_group: "rgCOMV-x".to_string(),
            vm: "VM1-x".to_string(),
            ..ResourceNames::random()
        },
        disk_plan: DiskPlan {
            data_disks: vec![
                PlannedDataDisk::implicit(100).at_lun(1),
                PlannedDataDisk::managed(50).at_lun(2),
            ],
        },
        detach_luns: vec![2],
        new_disk_sizes_gb: vec![],
        ..SampleSettings::default()
    };

    let report = run_sample(&cloud, &settings).await;

    assert!(report.succeeded(), "error: {:?}", report.error);
    assert_eq!(report.created_luns, luns(&[1, 2]));
    assert_eq!(report.updated_luns, luns(&[1]));
    let deleted = report.deleted_disk.as_ref().expect("detached disk deleted");
    assert!(deleted.name().starts_with("dsk-"), "got {deleted}");
    assert_eq!(report.resized.len(), 2);
    assert_eq!(
        report.resource_group.as_ref().map(|id| id.resource_group_name().to_string()),
        Some("rgCOMV-x".to_string())
    );
    assert!(matches!(report.cleanup, Cleanup::Deleted(_)));
    assert!(!cloud.resource_group_exists("rgCOMV-x"));
}

#[tokio::test]
async fn test_implicit_strategy_creates_only_the_existing_disk() {
    let cloud = SimulatedCloud::new(SUBSCRIPTION);
    let report = run_sample(&cloud, &settings(DiskAttachStrategy::Implicit)).await;

    assert!(report.succeeded(), "error: {:?}", report.error);
    assert_eq!(cloud.call_count(Operation::CreateDisk), 1);
    assert_eq!(cloud.calls()[1], Operation::CreateDisk, "existing disk comes first");
    assert_eq!(report.created_luns, luns(&[0, 1, 2, 3, 4]));
    assert!(report.deleted_disk.is_some());
    assert_eq!(cloud.call_count(Operation::DeleteResourceGroup), 1);
}

#[tokio::test]
async fn test_managed_strategy_creates_every_disk_first() {
    let cloud = SimulatedCloud::new(SUBSCRIPTION);
    let report = run_sample(&cloud, &settings(DiskAttachStrategy::Managed)).await;

    assert!(report.succeeded(), "error: {:?}", report.error);
    assert_eq!(cloud.call_count(Operation::CreateDisk), 5);
    assert_eq!(report.updated_luns, luns(&[0, 1, 2, 5]));
}

#[tokio::test]
async fn test_failure_stops_steps_and_still_cleans_up() {
    let failing = [
        (Operation::CreateDisk, 1),
        (Operation::CreateVirtualNetwork, 2),
        (Operation::CreateVirtualMachine, 3),
        (Operation::UpdateVirtualMachine, 4),
        (Operation::DeleteDisk, 5),
        (Operation::DeallocateVirtualMachine, 6),
        (Operation::ResizeDisk, 7),
        (Operation::StartVirtualMachine, 8),
    ];
    for (op, completed) in failing {
        let cloud = SimulatedCloud::new(SUBSCRIPTION).fail_on(op);
        let settings = settings(DiskAttachStrategy::Mixed);

        let report = run_sample(&cloud, &settings).await;

        assert!(!report.succeeded(), "{op:?} should fail the run");
        assert_eq!(report.completed.len(), completed, "{op:?}");
        assert_eq!(report.completed[0], Step::CreateResourceGroup);
        assert_eq!(cloud.call_count(op), 1, "{op:?} tried once");
        assert_eq!(cloud.call_count(Operation::DeleteResourceGroup), 1, "{op:?}");
        assert!(matches!(report.cleanup, Cleanup::Deleted(_)), "{op:?}");
        assert!(!cloud.resource_group_exists(&settings.names.resource_group));
        assert!(report.final_vm.is_none());
    }
}

#[tokio::test]
async fn test_failed_group_creation_needs_no_cleanup() {
    let cloud = SimulatedCloud::new(SUBSCRIPTION).fail_on(Operation::CreateResourceGroup);
    let report = run_sample(&cloud, &settings(DiskAttachStrategy::Mixed)).await;

    assert!(!report.succeeded());
    assert!(report.completed.is_empty());
    assert!(report.resource_group.is_none());
    assert_eq!(report.cleanup, Cleanup::NothingToCleanUp);
    assert_eq!(cloud.call_count(Operation::DeleteResourceGroup), 0);
    assert_eq!(cloud.calls(), vec![Operation::CreateResourceGroup]);
}

#[tokio::test]
async fn test_duplicate_luns_rejected_before_any_call() {
    let cloud = SimulatedCloud::new(SUBSCRIPTION);
    let settings = SampleSettings {
        disk_plan: DiskPlan {
            data_disks: vec![
                PlannedDataDisk::implicit(10).at_lun(1),
                PlannedDataDisk::managed(10).at_lun(1),
            ],
        },
        ..SampleSettings::default()
    };

    let report = run_sample(&cloud, &settings).await;

    assert!(!report.succeeded());
    assert!(cloud.calls().is_empty());
    assert_eq!(report.cleanup, Cleanup::NothingToCleanUp);
}

#[tokio::test]
async fn test_cleanup_failure_is_reported_not_raised() {
    let cloud = SimulatedCloud::new(SUBSCRIPTION).fail_on(Operation::DeleteResourceGroup);
    let settings = settings(DiskAttachStrategy::Mixed);

    let report = run_sample(&cloud, &settings).await;

    assert!(report.succeeded(), "steps themselves succeed");
    assert!(matches!(report.cleanup, Cleanup::Failed(_)));
    assert_eq!(cloud.call_count(Operation::DeleteResourceGroup), 1);
    assert!(cloud.resource_group_exists(&settings.names.resource_group));
    assert!(report.to_string().contains("Cleanup: FAILED"));
}
