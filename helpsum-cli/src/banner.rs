/// ASCII banner shown above the usage text.
pub const BANNER: &str = r"
 _          _
| |__   ___| |_ __  ___ _   _ _ __ ___
| '_ \ / _ \ | '_ \/ __| | | | '_ ` _ \
| | | |  __/ | |_) \__ \ |_| | | | | | |
|_| |_|\___|_| .__/|___/\__,_|_| |_| |_|
             |_|
";
