//! Real-time scheduling helpers (Linux SCHED_FIFO + mlockall; mlockall elsewhere).

use crate::cli::RtLock;

#[cfg(unix)]
fn lock_memory(lock: RtLock) -> std::io::Result<()> {
    use libc::{MCL_CURRENT, MCL_FUTURE, mlockall};
    let flags = match lock {
        RtLock::None => return Ok(()),
        RtLock::Current => MCL_CURRENT,
        RtLock::All => MCL_CURRENT | MCL_FUTURE,
    };
    let rc = unsafe { mlockall(flags) };
    if rc != 0 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(())
    }
}

#[cfg(unix)]
fn memlock_limit_hint() -> Option<String> {
    unsafe {
        let mut rlim = std::mem::MaybeUninit::<libc::rlimit>::uninit();
        if libc::getrlimit(libc::RLIMIT_MEMLOCK, rlim.as_mut_ptr()) != 0 {
            return None;
        }
        let cur = rlim.assume_init().rlim_cur;
        if cur == libc::RLIM_INFINITY {
            Some("memlock limit: unlimited".to_string())
        } else {
            Some(format!("memlock limit: {} KiB", cur / 1024))
        }
    }
}

#[cfg(unix)]
fn try_apply_mem_lock(lock: RtLock) -> eyre::Result<()> {
    let Err(err) = lock_memory(lock) else {
        return Ok(());
    };
    let retryable = matches!(err.raw_os_error(), Some(c) if c == libc::EPERM || c == libc::ENOMEM);
    // All failed for lack of privilege or memory: settle for resident pages.
    if lock == RtLock::All && retryable && lock_memory(RtLock::Current).is_ok() {
        tracing::warn!(error = %err, "mlockall(current|future) failed; locked current pages only");
        return Ok(());
    }
    let mut msg = format!("mlockall failed: {err}");
    if retryable {
        if let Some(h) = memlock_limit_hint() {
            msg.push_str(&format!("; {h}"));
        }
        msg.push_str("; hint: needs CAP_IPC_LOCK (or root) and sufficient 'ulimit -l'");
    }
    Err(eyre::eyre!(msg))
}

#[cfg(target_os = "linux")]
fn try_apply_fifo_priority(prio: Option<i32>) -> eyre::Result<()> {
    use libc::{SCHED_FIFO, sched_get_priority_max, sched_get_priority_min, sched_param};

    let (min, max) = unsafe {
        let min = sched_get_priority_min(SCHED_FIFO);
        let max = sched_get_priority_max(SCHED_FIFO);
        if min < 0 || max < 0 { (1, 99) } else { (min, max) }
    };
    let param = sched_param {
        sched_priority: prio.unwrap_or(max).clamp(min, max),
    };
    let rc = unsafe { libc::sched_setscheduler(0, SCHED_FIFO, &param) };
    if rc == 0 {
        return Ok(());
    }
    let err = std::io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::EPERM) {
        eyre::bail!(
            "{err}; needs CAP_SYS_NICE or root (effective UID {}). Hint: 'sudo setcap cap_sys_nice=ep /path/to/windvane'",
            unsafe { libc::geteuid() }
        );
    }
    Err(eyre::eyre!(err))
}

#[cfg(unix)]
fn apply_mem_lock(lock: RtLock) {
    match try_apply_mem_lock(lock) {
        Ok(()) => tracing::info!(?lock, "RT: memory lock applied"),
        Err(err) => tracing::warn!(error = %err, "RT: memory lock not applied"),
    }
}

#[cfg(not(unix))]
fn apply_mem_lock(lock: RtLock) {
    tracing::warn!(?lock, "RT: memory locking unsupported on this OS");
}

#[cfg(target_os = "linux")]
fn apply_fifo(prio: Option<i32>) {
    match try_apply_fifo_priority(prio) {
        Ok(()) => tracing::info!(prio = ?prio, "RT: SCHED_FIFO enabled"),
        Err(err) => tracing::warn!(error = %err, "RT: SCHED_FIFO not applied"),
    }
}

#[cfg(not(target_os = "linux"))]
fn apply_fifo(_prio: Option<i32>) {
    tracing::warn!("RT: SCHED_FIFO unavailable on this OS; only mlockall attempted");
}

/// Apply real-time settings once per process. Failures are logged, never fatal.
pub fn setup_rt_once(rt: bool, prio: Option<i32>, lock: RtLock) {
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();
    if !rt {
        return;
    }
    RT_ONCE.get_or_init(|| {
        apply_mem_lock(lock);
        apply_fifo(prio);
    });
}
