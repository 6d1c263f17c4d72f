fn main() {
    slint_build::compile("ui/app.slint").expect("编译Slint界面失败");
}
