/// Rounds `x` up to the nearest multiple of `factor`. `factor` must be positive.
#[inline]
pub fn round_up_to_multiple(x: i32, factor: i32) -> i32 {
    num::integer::div_ceil(x, factor) * factor
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
