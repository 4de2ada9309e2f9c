use std::time::Instant;

/// Run `f` and return the elapsed wall-clock time in seconds together with its result.
/// Only the two clock reads bracket the call.
#[inline]
pub fn measure<T>(f: impl FnOnce() -> T) -> (f64, T) {
    let start = Instant::now();
    let r = f();
    let elapsed = start.elapsed();
    (elapsed.as_secs_f64(), r)
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::measure;

    #[test]
    fn elapsed_time() {
        let (t, r) = measure(|| {
            std::thread::sleep(Duration::from_millis(5));
            42
        });
        assert_eq!(r, 42);
        assert!(t >= 0.005 && t.is_finite());

        let (t, _) = measure(|| ());
        assert!(t >= 0.);
    }
}
